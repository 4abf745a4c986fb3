//! Status of background generations, keyed by session.
//!
//! In asynchronous mode the HTTP layer acknowledges a request before the pipeline runs; the
//! caller then polls this store (through `GET /jobs/{session_id}`) or the file endpoint. A
//! newer job for the same session replaces the older entry, and updates from the older job are
//! ignored from then on.

use crate::assets::AssetFailure;
use crate::service::GeneratedReport;
use api_shared::{JobState, JobStatusRes, SkippedAsset};
use report_types::SessionId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Recorded state of one session's latest job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    pub docx_url: Option<String>,
    pub pptx_url: Option<String>,
    pub skipped_assets: Vec<AssetFailure>,
    pub error: Option<String>,
}

impl JobStatus {
    fn new(state: JobState) -> Self {
        Self {
            state,
            docx_url: None,
            pptx_url: None,
            skipped_assets: Vec::new(),
            error: None,
        }
    }

    /// Wire form for `session`.
    pub fn to_response(&self, session: &SessionId) -> JobStatusRes {
        JobStatusRes {
            session_id: session.to_string(),
            status: self.state,
            docx_url: self.docx_url.clone(),
            pptx_url: self.pptx_url.clone(),
            skipped_assets: self
                .skipped_assets
                .iter()
                .map(|f| SkippedAsset {
                    name: f.name.clone(),
                    reason: f.reason.clone(),
                })
                .collect(),
            error: self.error.clone(),
        }
    }
}

/// Identifies one accepted job; only the latest ticket of a session may update its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTicket(u64);

#[derive(Debug)]
struct JobEntry {
    ticket: JobTicket,
    status: JobStatus,
}

/// Shared, cloneable job status table.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<Mutex<HashMap<SessionId, JobEntry>>>,
    next_ticket: Arc<AtomicU64>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, JobEntry>> {
        // A panic while holding the lock leaves the map itself consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, session: &SessionId, ticket: JobTicket, status: JobStatus) {
        let mut jobs = self.lock();
        match jobs.get_mut(session) {
            Some(entry) if entry.ticket == ticket => {
                tracing::debug!(session = %session, state = ?status.state, "Job state changed");
                entry.status = status;
            }
            _ => tracing::debug!(
                session = %session,
                state = ?status.state,
                "Ignoring update from a superseded job"
            ),
        }
    }

    /// Records a new job for `session`, superseding any earlier one.
    pub fn accept(&self, session: &SessionId) -> JobTicket {
        let ticket = JobTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(session = %session, ticket = ticket.0, "Job accepted");
        self.lock().insert(
            session.clone(),
            JobEntry {
                ticket,
                status: JobStatus::new(JobState::Accepted),
            },
        );
        ticket
    }

    pub fn start(&self, session: &SessionId, ticket: JobTicket) {
        self.set(session, ticket, JobStatus::new(JobState::Running));
    }

    pub fn complete(&self, session: &SessionId, ticket: JobTicket, report: &GeneratedReport) {
        self.set(
            session,
            ticket,
            JobStatus {
                state: JobState::Completed,
                docx_url: Some(report.document.locator.clone()),
                pptx_url: Some(report.deck.locator.clone()),
                skipped_assets: report.skipped_assets.clone(),
                error: None,
            },
        );
    }

    pub fn fail(&self, session: &SessionId, ticket: JobTicket, error: impl ToString) {
        let mut status = JobStatus::new(JobState::Failed);
        status.error = Some(error.to_string());
        self.set(session, ticket, status);
    }

    pub fn get(&self, session: &SessionId) -> Option<JobStatus> {
        self.lock().get(session).map(|entry| entry.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::GeneratedArtifact;
    use std::path::PathBuf;

    fn artifact(locator: &str) -> GeneratedArtifact {
        GeneratedArtifact {
            file_name: "f".into(),
            path: PathBuf::from("f"),
            locator: locator.into(),
            uploaded: false,
            size_bytes: 0,
            sha256: String::new(),
        }
    }

    #[test]
    fn test_job_lifecycle() {
        let store = JobStore::new();
        let session = SessionId::sanitise("S1").unwrap();
        assert!(store.get(&session).is_none());

        let ticket = store.accept(&session);
        assert_eq!(store.get(&session).unwrap().state, JobState::Accepted);
        store.start(&session, ticket);
        assert_eq!(store.get(&session).unwrap().state, JobState::Running);

        let report = GeneratedReport {
            session_id: session.clone(),
            document: artifact("/files/S1/a.docx"),
            deck: artifact("/files/S1/a.pptx"),
            skipped_assets: vec![AssetFailure::new("chart", "status 404")],
        };
        store.complete(&session, ticket, &report);

        let res = store.get(&session).unwrap().to_response(&session);
        assert_eq!(res.status, JobState::Completed);
        assert_eq!(res.docx_url.as_deref(), Some("/files/S1/a.docx"));
        assert_eq!(res.pptx_url.as_deref(), Some("/files/S1/a.pptx"));
        assert_eq!(res.skipped_assets[0].name, "chart");
    }

    #[test]
    fn test_failure_records_error_and_clones_share_state() {
        let store = JobStore::new();
        let other = store.clone();
        let session = SessionId::sanitise("S2").unwrap();

        let ticket = store.accept(&session);
        other.fail(&session, ticket, "template missing");

        let status = store.get(&session).unwrap();
        assert_eq!(status.state, JobState::Failed);
        assert_eq!(status.error.as_deref(), Some("template missing"));
        assert!(status.docx_url.is_none());
    }

    #[test]
    fn test_superseded_job_cannot_overwrite_newer_status() {
        let store = JobStore::new();
        let session = SessionId::sanitise("S3").unwrap();

        let first = store.accept(&session);
        store.start(&session, first);
        let second = store.accept(&session);
        assert_ne!(first, second);

        let report = GeneratedReport {
            session_id: session.clone(),
            document: artifact("/files/S3/old.docx"),
            deck: artifact("/files/S3/old.pptx"),
            skipped_assets: Vec::new(),
        };
        store.complete(&session, first, &report);
        assert_eq!(store.get(&session).unwrap().state, JobState::Accepted);

        store.fail(&session, first, "late failure");
        assert!(store.get(&session).unwrap().error.is_none());

        store.start(&session, second);
        assert_eq!(store.get(&session).unwrap().state, JobState::Running);
    }

    #[test]
    fn test_update_for_unknown_session_is_ignored() {
        let store = JobStore::new();
        let known = SessionId::sanitise("S4").unwrap();
        let unknown = SessionId::sanitise("S5").unwrap();

        let ticket = store.accept(&known);
        store.fail(&unknown, ticket, "nope");

        assert!(store.get(&unknown).is_none());
    }
}
