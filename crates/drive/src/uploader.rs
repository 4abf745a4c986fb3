//! Best-effort uploads that never fail the caller.

use crate::{DriveStore, RemoteStore};
use report_types::SessionId;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Remote folder holding a session's uploads: `Temp_<session>`, unless the session id already
/// carries the prefix.
pub fn session_folder_name(session: &SessionId) -> String {
    let id = session.as_str();
    if id.starts_with("Temp_") {
        id.to_string()
    } else {
        format!("Temp_{id}")
    }
}

/// Hands generated files to an optional [`RemoteStore`].
///
/// Cheap to clone; constructed once at startup and shared by every request.
#[derive(Clone, Default)]
pub struct Uploader {
    store: Option<Arc<dyn RemoteStore>>,
}

impl std::fmt::Debug for Uploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uploader")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Uploader {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store: Some(store) }
    }

    /// An uploader whose uploads always yield `None`.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// A Drive-backed uploader when an access token is available, otherwise a disabled one.
    pub fn from_access_token(access_token: Option<&str>, timeout: Duration) -> Self {
        match access_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => Self::new(Arc::new(DriveStore::new(token, timeout))),
            None => Self::disabled(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Uploads `local_path` into the session's remote folder.
    ///
    /// # Returns
    ///
    /// The shareable URL, or `None` if uploads are disabled or any step failed. Failures are
    /// logged, never returned.
    pub fn upload(&self, session: &SessionId, local_path: &Path, display_name: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        let folder_name = session_folder_name(session);

        let result = store
            .ensure_folder(&folder_name)
            .and_then(|folder_id| store.upload(local_path, display_name, &folder_id));

        match result {
            Ok(url) => {
                tracing::info!(session = %session, file = display_name, url = %url, "Uploaded file");
                Some(url)
            }
            Err(e) => {
                tracing::warn!(
                    session = %session,
                    file = display_name,
                    error = %e,
                    "Upload failed; falling back to local file"
                );
                None
            }
        }
    }
}
