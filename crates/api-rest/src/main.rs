//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `reportgen-run` binary serves the
//! same router and additionally loads a `.env` file.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the report generator REST API server
///
/// # Environment Variables
/// - `REPORTGEN_REST_ADDR`: Server address (default: "0.0.0.0:10010")
/// - see `CoreConfig::from_env` for the generation settings
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration or templates are invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("reportgen_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("REPORTGEN_REST_ADDR")
        .unwrap_or_else(|_| api_rest::DEFAULT_REST_ADDR.into());
    let state = api_rest::AppState::from_env(None, None)?;

    api_rest::serve(&addr, state).await
}
