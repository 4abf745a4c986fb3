//! Bounded background generation for asynchronous mode.
//!
//! Each accepted request becomes a task that waits for one of `max_jobs` permits and then runs
//! the blocking pipeline on tokio's blocking pool. Progress is recorded in the [`JobStore`].
//! There is no cancellation: an accepted job runs to completion or fails into the store and
//! the logs. A job superseded by a newer submission for the same session still runs, but its
//! status updates are dropped by the store.

use reportgen_core::{GenerateRequest, JobStore, ReportService};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct GenerationWorker {
    service: ReportService,
    jobs: JobStore,
    permits: Arc<Semaphore>,
}

impl GenerationWorker {
    pub fn new(service: ReportService, jobs: JobStore, max_jobs: usize) -> Self {
        Self {
            service,
            jobs,
            permits: Arc::new(Semaphore::new(max_jobs)),
        }
    }

    /// Records the job as accepted and schedules it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: GenerateRequest) -> JoinHandle<()> {
        let session = request.session_id.clone();
        let ticket = self.jobs.accept(&session);
        tracing::info!(session = %session, "Accepted background generation");

        let service = self.service.clone();
        let jobs = self.jobs.clone();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    jobs.fail(&session, ticket, format!("worker pool closed: {e}"));
                    return;
                }
            };

            jobs.start(&session, ticket);
            match tokio::task::spawn_blocking(move || service.generate(request)).await {
                Ok(Ok(report)) => jobs.complete(&session, ticket, &report),
                Ok(Err(e)) => {
                    tracing::error!(session = %session, "Background generation failed: {:?}", e);
                    jobs.fail(&session, ticket, e);
                }
                Err(e) => {
                    tracing::error!(session = %session, "Background generation panicked: {:?}", e);
                    jobs.fail(&session, ticket, format!("generation task failed: {e}"));
                }
            }
        })
    }
}
