//! Session-scoped file storage service implementation
//!
//! [`SessionFiles`] maps sanitised session identifiers to working directories under
//! `<root>/temp_sessions/` and performs every read and write the report pipeline needs.
//!
//! # Security Model
//!
//! - The sessions root is canonicalised once at construction
//! - Writes take a [`SessionId`], which cannot contain separators or dots
//! - Reads from untrusted input reject any component containing `/`, `\`, `..` or NUL, then
//!   canonicalise the resolved path and require it to stay under the sessions root (this also
//!   catches symlinks pointing elsewhere)

use crate::{FilesError, FilesResult, DEFAULT_MEDIA_TYPE, SESSIONS_FOLDER_NAME};
use chrono::{DateTime, Utc};
use report_types::{NonEmptyText, SessionId};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Metadata for a file written into a session directory.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct StoredFile {
    /// File name inside the session directory
    pub file_name: NonEmptyText,

    /// Absolute path of the stored file
    pub path: PathBuf,

    /// Path relative to the sessions root: `<session_id>/<file_name>`
    pub relative_path: NonEmptyText,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Hexadecimal SHA-256 digest of the content
    pub sha256: String,

    /// Media type from the file extension, or detected from the content
    pub media_type: NonEmptyText,

    /// UTC timestamp when the file was written
    pub stored_at: DateTime<Utc>,
}

/// Service for managing per-session working directories.
///
/// Cheap to clone; holds only the canonical sessions root.
#[derive(Debug, Clone)]
pub struct SessionFiles {
    sessions_root: PathBuf,
}

impl SessionFiles {
    /// Creates a `SessionFiles` rooted at `<root_directory>/temp_sessions`.
    ///
    /// # Arguments
    ///
    /// * `root_directory` - Storage root; it and the sessions folder are created if missing
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if:
    /// - `root_directory` exists but is not a directory
    /// - the sessions folder cannot be created
    /// - path canonicalisation fails
    pub fn new(root_directory: &Path) -> FilesResult<Self> {
        if root_directory.exists() && !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let sessions_root = root_directory.join(SESSIONS_FOLDER_NAME);
        fs::create_dir_all(&sessions_root).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot create sessions directory {}: {}",
                sessions_root.display(),
                e
            ))
        })?;

        let sessions_root = sessions_root.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                sessions_root.display(),
                e
            ))
        })?;

        Ok(Self { sessions_root })
    }

    /// Returns the canonical sessions root (`<root>/temp_sessions`).
    #[must_use]
    pub fn sessions_root(&self) -> &Path {
        &self.sessions_root
    }

    /// Returns the working directory for `session`. The directory may not exist yet.
    #[must_use]
    pub fn session_dir(&self, session: &SessionId) -> PathBuf {
        self.sessions_root.join(session.as_str())
    }

    /// Creates the session's working directory if it does not exist.
    ///
    /// Calling this repeatedly for the same session is harmless.
    ///
    /// # Returns
    ///
    /// Absolute path of the session directory.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the directory cannot be created.
    pub fn ensure_session_dir(&self, session: &SessionId) -> FilesResult<PathBuf> {
        let dir = self.session_dir(session);
        fs::create_dir_all(&dir).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create session directory {}: {}", dir.display(), e),
            ))
        })?;
        Ok(dir)
    }

    /// Writes `bytes` to `<session_dir>/<file_name>`, replacing any previous content.
    ///
    /// # Arguments
    ///
    /// * `session` - Owning session; its directory is created if needed
    /// * `file_name` - A single path component
    /// * `bytes` - File content
    ///
    /// # Returns
    ///
    /// `StoredFile` with the location, size, SHA-256 digest and media type of the written file.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` if `file_name` is not a safe single component, or
    /// `FilesError::Io` if the directory or file cannot be written.
    pub fn write(
        &self,
        session: &SessionId,
        file_name: &str,
        bytes: &[u8],
    ) -> FilesResult<StoredFile> {
        validate_component(file_name)?;
        let dir = self.ensure_session_dir(session)?;
        let path = dir.join(file_name);

        fs::write(&path, bytes).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write file to {}: {}", path.display(), e),
            ))
        })?;

        let stored = StoredFile {
            file_name: text(file_name)?,
            relative_path: text(format!("{}/{}", session.as_str(), file_name))?,
            size_bytes: bytes.len() as u64,
            sha256: sha256_hex(bytes),
            media_type: text(media_type_for(file_name, bytes))?,
            stored_at: Utc::now(),
            path,
        };
        tracing::debug!(
            file = %stored.relative_path,
            size_bytes = stored.size_bytes,
            sha256 = %stored.sha256,
            "Stored session file"
        );
        Ok(stored)
    }

    /// Resolves `<session_id>/<file_name>` from untrusted input to an existing file.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` if either component is unsafe or the resolved path
    /// escapes the sessions root, and `FilesError::NotFound` if no such file exists.
    pub fn resolve(&self, session_id: &str, file_name: &str) -> FilesResult<PathBuf> {
        validate_component(session_id)?;
        validate_component(file_name)?;

        let candidate = self.sessions_root.join(session_id).join(file_name);
        if !candidate.is_file() {
            return Err(FilesError::NotFound(format!("{session_id}/{file_name}")));
        }

        let canonical = candidate.canonicalize().map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Cannot canonicalize path {}: {}", candidate.display(), e),
            ))
        })?;
        if !canonical.starts_with(&self.sessions_root) {
            return Err(FilesError::InvalidPath(format!(
                "{session_id}/{file_name} resolves outside the sessions directory"
            )));
        }
        Ok(canonical)
    }

    /// Reads a session file for serving.
    ///
    /// # Returns
    ///
    /// The file content and its media type.
    ///
    /// # Errors
    ///
    /// As [`Self::resolve`], plus `FilesError::Io` if the file cannot be read.
    pub fn read(&self, session_id: &str, file_name: &str) -> FilesResult<(Vec<u8>, String)> {
        let path = self.resolve(session_id, file_name)?;
        let bytes = fs::read(&path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read file from {}: {}", path.display(), e),
            ))
        })?;
        let media_type = media_type_for(file_name, &bytes);
        Ok((bytes, media_type))
    }
}

/// Media type for a file, by extension first and content sniffing second.
///
/// Office formats are zip containers, so the extension is more specific than the content.
pub fn media_type_for(file_name: &str, bytes: &[u8]) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let by_extension = match extension.as_deref() {
        Some("docx") => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        Some("pptx") => {
            Some("application/vnd.openxmlformats-officedocument.presentationml.presentation")
        }
        Some("xlsx") => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        Some("png") => Some("image/png"),
        Some("jpg") | Some("jpeg") => Some("image/jpeg"),
        Some("pdf") => Some("application/pdf"),
        _ => None,
    };

    by_extension
        .map(str::to_string)
        .or_else(|| infer::get(bytes).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string())
}

/// A name is safe when it is one non-empty path component with no separators or dot-dot.
fn validate_component(name: &str) -> FilesResult<()> {
    let unsafe_name = name.trim().is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if unsafe_name {
        return Err(FilesError::InvalidPath(format!("Unsafe path component: {name:?}")));
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn text(value: impl AsRef<str>) -> FilesResult<NonEmptyText> {
    NonEmptyText::new(value.as_ref())
        .map_err(|e| FilesError::InvalidPath(format!("{}: {:?}", e, value.as_ref())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(raw: &str) -> SessionId {
        SessionId::sanitise(raw).unwrap()
    }

    #[test]
    fn test_new_creates_sessions_folder() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        assert!(files.sessions_root().is_dir());
        assert!(files.sessions_root().ends_with(SESSIONS_FOLDER_NAME));
    }

    #[test]
    fn test_new_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("storage");
        let files = SessionFiles::new(&root).unwrap();
        assert!(files.sessions_root().starts_with(temp.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_new_rejects_file_as_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("file.txt");
        fs::write(&root, "not a directory").unwrap();
        assert!(matches!(
            SessionFiles::new(&root),
            Err(FilesError::InvalidRootDirectory(_))
        ));
    }

    #[test]
    fn test_ensure_session_dir_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        let id = session("S1");

        let first = files.ensure_session_dir(&id).unwrap();
        fs::write(first.join("keep.txt"), "x").unwrap();
        let second = files.ensure_session_dir(&id).unwrap();

        assert_eq!(first, second);
        assert!(second.join("keep.txt").exists());
    }

    #[test]
    fn test_traversal_session_stays_inside_root() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        let id = session("../../outside");

        let dir = files.ensure_session_dir(&id).unwrap();
        assert!(dir.starts_with(files.sessions_root()));
        assert_eq!(dir.parent().unwrap(), files.sessions_root());
    }

    #[test]
    fn test_write_records_metadata() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        let stored = files.write(&session("S1"), "hello.txt", b"hello").unwrap();

        assert_eq!(stored.file_name.as_str(), "hello.txt");
        assert_eq!(stored.relative_path.as_str(), "S1/hello.txt");
        assert_eq!(stored.size_bytes, 5);
        assert_eq!(
            stored.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(stored.media_type.as_str(), DEFAULT_MEDIA_TYPE);
        assert_eq!(fs::read(&stored.path).unwrap(), b"hello");
    }

    #[test]
    fn test_write_overwrites_previous_content() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        let id = session("S1");
        files.write(&id, "a.txt", b"first").unwrap();
        let stored = files.write(&id, "a.txt", b"second").unwrap();
        assert_eq!(fs::read(stored.path).unwrap(), b"second");
    }

    #[test]
    fn test_write_rejects_unsafe_file_name() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        let err = files.write(&session("S1"), "../evil.txt", b"x").unwrap_err();
        assert!(matches!(err, FilesError::InvalidPath(_)));
    }

    #[test]
    fn test_read_returns_content_and_media_type() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        files.write(&session("S1"), "report.docx", b"PK\x03\x04").unwrap();

        let (bytes, media_type) = files.read("S1", "report.docx").unwrap();
        assert_eq!(bytes, b"PK\x03\x04");
        assert_eq!(
            media_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn test_read_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        fs::write(temp.path().join("secret.txt"), "secret").unwrap();

        for (session_id, file_name) in [
            ("..", "secret.txt"),
            ("S1", "../../secret.txt"),
            ("S1/..", "secret.txt"),
            ("S1", "..\\secret.txt"),
            ("", "secret.txt"),
        ] {
            assert!(
                matches!(
                    files.read(session_id, file_name),
                    Err(FilesError::InvalidPath(_))
                ),
                "{session_id}/{file_name} should be rejected"
            );
        }
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        assert!(matches!(
            files.read("S1", "missing.docx"),
            Err(FilesError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_rejects_symlink_escaping_root() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        let outside = temp.path().join("outside.txt");
        fs::write(&outside, "secret").unwrap();

        let dir = files.ensure_session_dir(&session("S1")).unwrap();
        std::os::unix::fs::symlink(&outside, dir.join("link.txt")).unwrap();

        assert!(matches!(
            files.read("S1", "link.txt"),
            Err(FilesError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for("chart.PNG", b""), "image/png");
        assert_eq!(media_type_for("a.jpg", b""), "image/jpeg");
        assert_eq!(
            media_type_for("deck.pptx", b""),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );
        assert_eq!(
            media_type_for("blob", &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            "image/png"
        );
        assert_eq!(media_type_for("notes", b"plain"), DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_stored_file_serialises() {
        let temp = TempDir::new().unwrap();
        let files = SessionFiles::new(temp.path()).unwrap();
        let stored = files.write(&session("S1"), "a.png", b"x").unwrap();

        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored);
    }
}
