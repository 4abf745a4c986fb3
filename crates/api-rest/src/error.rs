//! Translation of core errors into HTTP responses.

use api_shared::ErrorRes;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use reportgen_core::ReportError;
use reportgen_files::FilesError;

/// An error response: status plus `{"error": "<detail>"}`.
///
/// Detail is passed through in full; this is an internal service and callers debug with it.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        if err.is_client_error() {
            tracing::warn!("Rejected request: {}", err);
            Self::new(StatusCode::BAD_REQUEST, err.to_string())
        } else {
            tracing::error!("Request failed: {:?}", err);
            Self::internal(err.to_string())
        }
    }
}

impl From<FilesError> for ApiError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::InvalidPath(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            FilesError::NotFound(_) => Self::not_found(err.to_string()),
            other => {
                tracing::error!("File access failed: {:?}", other);
                Self::internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!("Blocking task failed: {:?}", err);
        Self::internal(format!("generation task failed: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorRes { error: self.message })).into_response()
    }
}
