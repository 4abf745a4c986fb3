use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the report generator service
///
/// Loads `.env` if present, initialises logging, resolves configuration once and serves the
/// REST API (generation, intake, file serving, job status and Swagger UI).
///
/// # Environment Variables
/// - `REPORTGEN_REST_ADDR`: REST server address (default: "0.0.0.0:10010")
/// - `REPORTGEN_ROOT`: storage root; sessions live under `<root>/temp_sessions` (default: ".")
/// - `REPORTGEN_TEMPLATE_DIR`: template directory (default: `templates/`)
/// - `REPORTGEN_MODE`: `sync` or `async` (default: `sync`)
/// - `REPORTGEN_MAX_JOBS`: concurrent background generations (default: 4)
/// - `REPORTGEN_PUBLIC_BASE_URL`: prefix for locally served file URLs
/// - `REPORTGEN_FETCH_TIMEOUT_SECS`: asset download and upload timeout (default: 30)
/// - `GOOGLE_DRIVE_ACCESS_TOKEN`: enables uploads to Google Drive
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reportgen_run=info".parse()?)
                .add_directive("reportgen_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("REPORTGEN_REST_ADDR").unwrap_or_else(|_| api_rest::DEFAULT_REST_ADDR.into());

    let state = api_rest::AppState::from_env(None, None)?;
    api_rest::serve(&rest_addr, state).await
}
