//! HTTP handlers.

use crate::error::ApiError;
use crate::AppState;
use api_shared::{
    AcceptedRes, ErrorRes, GenerateAssessmentReq, GenerateAssessmentRes, GenerateIntakeReq,
    GenerateIntakeRes, HealthRes, HealthService, JobStatusRes, SkippedAsset,
};
use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use reportgen_core::{GenerateRequest, GenerationMode, IntakeRequest, SessionId};

pub(crate) const LIVENESS_TEXT: &str = "✅ docx-generator-api is live";

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancer checks.
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

/// Plain-text liveness check; answers `GET` and `HEAD`.
pub async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

#[utoipa::path(
    post,
    path = "/generate_assessment",
    request_body = GenerateAssessmentReq,
    responses(
        (status = 200, description = "Report generated (sync mode)", body = GenerateAssessmentRes),
        (status = 202, description = "Generation accepted (async mode)", body = AcceptedRes),
        (status = 400, description = "Missing or invalid input", body = ErrorRes),
        (status = 422, description = "Body is not a JSON object of the expected shape", body = ErrorRes),
        (status = 500, description = "Generation failed", body = ErrorRes)
    )
)]
/// Generate the assessment report and executive deck for a session
///
/// The payload is adapted and validated before anything is written, so input errors are
/// reported as `400` in both modes. In synchronous mode the response carries the locators of
/// both artifacts; in asynchronous mode the job is queued and its progress is available from
/// `GET /jobs/{session_id}`.
///
/// # Errors
/// Returns `400 Bad Request` if a required field is missing or a value contains placeholder
/// syntax, a `4xx` with the same `{"error"}` body if the JSON itself is rejected, and
/// `500 Internal Server Error` if a template cannot be loaded or an artifact
/// cannot be written.
pub async fn generate_assessment(
    State(state): State<AppState>,
    payload: Result<Json<GenerateAssessmentReq>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    let request = GenerateRequest::try_from(req)?;
    state.service.placeholders(&request)?;

    match state.service.config().mode() {
        GenerationMode::Async => {
            let session_id = request.session_id.to_string();
            state.worker.submit(request);
            let body = AcceptedRes {
                session_id,
                status: "processing".into(),
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
        GenerationMode::Sync => {
            let service = state.service.clone();
            let report = tokio::task::spawn_blocking(move || service.generate(request)).await??;
            let body = GenerateAssessmentRes {
                session_id: report.session_id.to_string(),
                docx_url: report.document.locator,
                pptx_url: report.deck.locator,
                skipped_assets: report
                    .skipped_assets
                    .into_iter()
                    .map(|f| SkippedAsset {
                        name: f.name,
                        reason: f.reason,
                    })
                    .collect(),
            };
            Ok(Json(body).into_response())
        }
    }
}

#[utoipa::path(
    post,
    path = "/generate_intake",
    request_body = GenerateIntakeReq,
    responses(
        (status = 200, description = "Intake document generated", body = GenerateIntakeRes),
        (status = 400, description = "Missing or invalid input", body = ErrorRes),
        (status = 500, description = "Generation failed", body = ErrorRes)
    )
)]
/// Generate the intake summary document for a session.
pub async fn generate_intake(
    State(state): State<AppState>,
    payload: Result<Json<GenerateIntakeReq>, JsonRejection>,
) -> Result<Json<GenerateIntakeRes>, ApiError> {
    let Json(req) = payload?;
    let request = IntakeRequest::try_from(req)?;
    let session_id = request.session_id.to_string();

    let service = state.service.clone();
    let artifact = tokio::task::spawn_blocking(move || service.generate_intake(request)).await??;

    Ok(Json(GenerateIntakeRes {
        session_id,
        file_name: artifact.file_name,
        file_url: artifact.locator,
    }))
}

#[utoipa::path(
    get,
    path = "/files/{session_id}/{file_name}",
    params(
        ("session_id" = String, Path, description = "Session identifier"),
        ("file_name" = String, Path, description = "File inside the session directory")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Unsafe path", body = ErrorRes),
        (status = 404, description = "No such file", body = ErrorRes)
    )
)]
/// Serve a generated file from a session directory
///
/// # Errors
/// Returns `400 Bad Request` for names that are not a single safe path component or that
/// resolve outside the sessions directory, and `404 Not Found` if the file does not exist.
pub async fn serve_file(
    State(state): State<AppState>,
    AxumPath((session_id, file_name)): AxumPath<(String, String)>,
) -> Result<Response, ApiError> {
    let files = state.service.files().clone();
    let (bytes, media_type) =
        tokio::task::spawn_blocking(move || files.read(&session_id, &file_name)).await??;

    Ok(([(header::CONTENT_TYPE, media_type)], bytes).into_response())
}

#[utoipa::path(
    get,
    path = "/jobs/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session identifier")
    ),
    responses(
        (status = 200, description = "Latest job status for the session", body = JobStatusRes),
        (status = 404, description = "No job recorded for the session", body = ErrorRes)
    )
)]
/// Status of the latest background generation for a session.
pub async fn job_status(
    State(state): State<AppState>,
    AxumPath(session_id): AxumPath<String>,
) -> Result<Json<JobStatusRes>, ApiError> {
    let session = SessionId::sanitise(&session_id)
        .map_err(|_| ApiError::not_found(format!("no job for session {session_id:?}")))?;
    let status = state
        .jobs
        .get(&session)
        .ok_or_else(|| ApiError::not_found(format!("no job for session {session}")))?;
    Ok(Json(status.to_response(&session)))
}
