//! Remote file store for generated reports.
//!
//! Uploading is optional: the report pipeline talks to an [`Uploader`], which holds an
//! optional [`RemoteStore`]. With no store configured, or when the store fails, an upload
//! yields `None` and the caller falls back to a locally served locator.
//!
//! [`DriveStore`] implements the store against the Google Drive v3 REST API with a bearer
//! access token.

mod drive;
mod uploader;

pub use drive::DriveStore;
pub use uploader::{session_folder_name, Uploader};

use std::path::Path;

/// Errors raised by a remote store.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    /// The HTTP request could not be sent or its response could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with a non-success status
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The response did not contain an expected field
    #[error("unexpected response from {operation}: missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    /// The local file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DriveResult<T> = std::result::Result<T, DriveError>;

/// A remote folder-and-file store.
///
/// Implementations perform blocking I/O; call them from a blocking context.
pub trait RemoteStore: Send + Sync {
    /// Returns the id of the folder called `name`, creating it if it does not exist.
    fn ensure_folder(&self, name: &str) -> DriveResult<String>;

    /// Uploads `local_path` as `display_name` into folder `folder_id` and returns a shareable
    /// URL for it.
    fn upload(&self, local_path: &Path, display_name: &str, folder_id: &str) -> DriveResult<String>;
}
