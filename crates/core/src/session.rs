//! Session Output Manager.
//!
//! Names, saves and publishes generated artifacts. Every saved artifact gets a locator: the
//! remote share URL when an upload succeeds, otherwise the path under which the file-serving
//! endpoint exposes it.

use crate::constants::{
    DECK_OUTPUT_STEM, DOCUMENT_OUTPUT_STEM, FILES_ROUTE_PREFIX, INTAKE_OUTPUT_STEM,
};
use crate::ReportResult;
use report_types::SessionId;
use reportgen_drive::Uploader;
use reportgen_files::SessionFiles;
use serde::Serialize;
use std::path::PathBuf;

/// A saved output file and where to retrieve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub locator: String,
    /// True when `locator` is a remote share URL.
    pub uploaded: bool,
    pub size_bytes: u64,
    pub sha256: String,
}

pub fn document_file_name(session: &SessionId) -> String {
    format!("{DOCUMENT_OUTPUT_STEM}_{session}.docx")
}

pub fn deck_file_name(session: &SessionId) -> String {
    format!("{DECK_OUTPUT_STEM}_{session}.pptx")
}

pub fn intake_file_name(session: &SessionId) -> String {
    format!("{INTAKE_OUTPUT_STEM}_{session}.docx")
}

/// Locator of a session file as served by the file endpoint.
///
/// Relative (`/files/<session>/<file>`) unless a public base URL is configured.
pub fn local_locator(public_base_url: Option<&str>, session: &SessionId, file_name: &str) -> String {
    format!(
        "{}{FILES_ROUTE_PREFIX}/{session}/{file_name}",
        public_base_url.unwrap_or_default()
    )
}

/// Saves artifacts into session directories and publishes them.
#[derive(Debug, Clone)]
pub struct SessionOutput {
    files: SessionFiles,
    uploader: Uploader,
    public_base_url: Option<String>,
}

impl SessionOutput {
    pub fn new(files: SessionFiles, uploader: Uploader, public_base_url: Option<String>) -> Self {
        Self {
            files,
            uploader,
            public_base_url,
        }
    }

    pub fn files(&self) -> &SessionFiles {
        &self.files
    }

    /// Writes `bytes` as `<session_dir>/<file_name>` and obtains its locator.
    ///
    /// An unavailable or failing upload is logged by the uploader and the local locator is
    /// returned instead.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Files` if the file cannot be written.
    pub fn save(
        &self,
        session: &SessionId,
        file_name: &str,
        bytes: &[u8],
    ) -> ReportResult<GeneratedArtifact> {
        let stored = self.files.write(session, file_name, bytes)?;
        tracing::info!(
            session = %session,
            file = file_name,
            size_bytes = stored.size_bytes,
            sha256 = %stored.sha256,
            media_type = %stored.media_type,
            "Saved artifact"
        );

        let remote = self.uploader.upload(session, &stored.path, file_name);
        let uploaded = remote.is_some();
        let locator = remote.unwrap_or_else(|| {
            local_locator(self.public_base_url.as_deref(), session, file_name)
        });

        Ok(GeneratedArtifact {
            file_name: file_name.to_string(),
            path: stored.path,
            locator,
            uploaded,
            size_bytes: stored.size_bytes,
            sha256: stored.sha256,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportgen_drive::{DriveError, DriveResult, RemoteStore};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FixedStore {
        fail: bool,
    }

    impl RemoteStore for FixedStore {
        fn ensure_folder(&self, name: &str) -> DriveResult<String> {
            Ok(format!("folder-{name}"))
        }

        fn upload(&self, _local_path: &Path, display_name: &str, folder_id: &str) -> DriveResult<String> {
            if self.fail {
                return Err(DriveError::Status {
                    operation: "upload",
                    status: 403,
                    body: "forbidden".into(),
                });
            }
            Ok(format!("https://remote/{folder_id}/{display_name}"))
        }
    }

    fn session() -> SessionId {
        SessionId::sanitise("S1").unwrap()
    }

    #[test]
    fn test_output_names_are_deterministic() {
        let s = session();
        assert_eq!(
            document_file_name(&s),
            "IT_Current_Status_Assessment_Report_S1.docx"
        );
        assert_eq!(deck_file_name(&s), "IT_Current_Status_Executive_Report_S1.pptx");
        assert_eq!(intake_file_name(&s), "intake_S1.docx");
    }

    #[test]
    fn test_local_locator() {
        let s = session();
        assert_eq!(local_locator(None, &s, "a.docx"), "/files/S1/a.docx");
        assert_eq!(
            local_locator(Some("https://reports.example"), &s, "a.docx"),
            "https://reports.example/files/S1/a.docx"
        );
    }

    #[test]
    fn test_save_without_uploader_returns_local_locator() {
        let temp = TempDir::new().unwrap();
        let output = SessionOutput::new(
            SessionFiles::new(temp.path()).unwrap(),
            Uploader::disabled(),
            None,
        );

        let artifact = output.save(&session(), "report.docx", b"bytes").unwrap();

        assert!(!artifact.uploaded);
        assert_eq!(artifact.locator, "/files/S1/report.docx");
        assert!(artifact.path.ends_with("temp_sessions/S1/report.docx"));
        assert_eq!(std::fs::read(&artifact.path).unwrap(), b"bytes");
        assert_eq!(artifact.size_bytes, 5);
    }

    #[test]
    fn test_save_uses_remote_url_when_upload_succeeds() {
        let temp = TempDir::new().unwrap();
        let output = SessionOutput::new(
            SessionFiles::new(temp.path()).unwrap(),
            Uploader::new(Arc::new(FixedStore { fail: false })),
            None,
        );

        let artifact = output.save(&session(), "report.docx", b"bytes").unwrap();

        assert!(artifact.uploaded);
        assert_eq!(artifact.locator, "https://remote/folder-Temp_S1/report.docx");
    }

    #[test]
    fn test_failed_upload_falls_back_to_local_locator() {
        let temp = TempDir::new().unwrap();
        let output = SessionOutput::new(
            SessionFiles::new(temp.path()).unwrap(),
            Uploader::new(Arc::new(FixedStore { fail: true })),
            Some("http://localhost:10010".into()),
        );

        let artifact = output.save(&session(), "deck.pptx", b"bytes").unwrap();

        assert!(!artifact.uploaded);
        assert_eq!(artifact.locator, "http://localhost:10010/files/S1/deck.pptx");
    }
}
