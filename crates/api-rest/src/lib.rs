//! # API REST
//!
//! REST API for the report generator.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//! - The bounded background worker used in asynchronous mode
//!
//! Uses `api-shared` for wire types and `reportgen-core` for generation.

#![warn(rust_2018_idioms)]

mod error;
mod handlers;
mod worker;

pub use error::ApiError;
pub use worker::GenerationWorker;

use axum::{
    routing::{get, post},
    Router,
};
use reportgen_core::{config::validate_templates, CoreConfig, JobStore, ReportService, Uploader};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Default listen address when `REPORTGEN_REST_ADDR` is not set.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:10010";

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    service: ReportService,
    jobs: JobStore,
    worker: GenerationWorker,
}

impl AppState {
    /// Builds the state around `service`, with a job store and a worker sized by the
    /// configured `max_jobs`.
    pub fn new(service: ReportService) -> Self {
        let jobs = JobStore::new();
        let worker = GenerationWorker::new(service.clone(), jobs.clone(), service.config().max_jobs());
        Self {
            service,
            jobs,
            worker,
        }
    }

    /// Resolves configuration from the environment, checks the templates and constructs the
    /// collaborators.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, the assessment templates are missing
    /// or unreadable, or the sessions directory cannot be created.
    pub fn from_env(
        storage_root: Option<PathBuf>,
        template_dir: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let cfg = Arc::new(CoreConfig::from_env(storage_root, template_dir)?);
        validate_templates(cfg.template_dir())?;
        tracing::info!(
            templates = %cfg.template_dir().display(),
            root = %cfg.storage_root().display(),
            mode = ?cfg.mode(),
            max_jobs = cfg.max_jobs(),
            "Configuration resolved"
        );

        let uploader = Uploader::from_access_token(cfg.drive_access_token(), cfg.fetch_timeout());
        if !uploader.is_enabled() {
            tracing::info!("No Drive access token configured; files are served locally only");
        }

        let service = ReportService::new(cfg, uploader)?;
        Ok(Self::new(service))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::generate_assessment,
        handlers::generate_intake,
        handlers::serve_file,
        handlers::job_status,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::GenerateAssessmentReq,
        api_shared::GenerateAssessmentRes,
        api_shared::SkippedAsset,
        api_shared::AcceptedRes,
        api_shared::IntakeAnswers,
        api_shared::GenerateIntakeReq,
        api_shared::GenerateIntakeRes,
        api_shared::JobState,
        api_shared::JobStatusRes,
        api_shared::ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/health", get(handlers::health))
        .route("/generate_assessment", post(handlers::generate_assessment))
        .route("/generate_intake", post(handlers::generate_intake))
        .route("/files/:session_id/:file_name", get(handlers::serve_file))
        .route("/jobs/:session_id", get(handlers::job_status))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the REST API on `addr` until the server fails.
///
/// # Errors
/// Returns an error if the address cannot be bound or the HTTP server fails while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    tracing::info!("++ Starting report generator REST API on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
