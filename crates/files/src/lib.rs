//! Report Generator File Storage
//!
//! This crate owns the on-disk side of report generation: one working directory per session,
//! the generated documents and downloaded assets inside it, and safe lookups for the
//! file-serving endpoint.
//!
//! ## Design Principles
//!
//! - Every path is built from a sanitised [`SessionId`](report_types::SessionId) and a single
//!   file-name component, so nothing can be written outside the session root
//! - Session directories are created lazily and idempotently
//! - Directories are never deleted by this crate; clean-up is an operational concern
//! - Lookups from untrusted input (URL path segments) are validated and canonicalised before
//!   any file is opened
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! └── temp_sessions/
//!     └── <session_id>/
//!         ├── <asset_name>.png
//!         ├── IT_Current_Status_Assessment_Report_<session_id>.docx
//!         └── IT_Current_Status_Executive_Report_<session_id>.pptx
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use reportgen_files::SessionFiles;
//! use report_types::SessionId;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let files = SessionFiles::new(Path::new("."))?;
//! let session = SessionId::sanitise("S1")?;
//!
//! let stored = files.write(&session, "notes.txt", b"hello")?;
//! println!("{} ({} bytes)", stored.relative_path, stored.size_bytes);
//! # Ok(())
//! # }
//! ```

mod constants;
mod sessions;

pub use constants::{DEFAULT_MEDIA_TYPE, SESSIONS_FOLDER_NAME};
pub use sessions::{media_type_for, SessionFiles, StoredFile};

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory could not be created, or exists but is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed (potential directory traversal or unsafe name)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The requested session file does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FilesResult<T> = std::result::Result<T, FilesError>;
