//! Asset Resolver.
//!
//! Downloads the chart images a request references into the session directory. Failures are
//! per asset: a bad URL, an error status or a write failure skips that asset and is recorded,
//! the remaining assets and the rest of the pipeline carry on.

use report_types::SessionId;
use reportgen_files::SessionFiles;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const DRIVE_HOST: &str = "drive.google.com";

/// A named image to fetch, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub name: String,
    pub url: String,
}

impl AssetReference {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A downloaded asset inside the session directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    /// Logical name as supplied by the caller.
    pub name: String,
    pub path: PathBuf,
}

/// An asset that was skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetFailure {
    pub name: String,
    pub reason: String,
}

impl AssetFailure {
    pub fn new(name: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of resolving a request's assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedAssets {
    /// Successfully stored assets, in input order.
    pub assets: Vec<LocalAsset>,
    pub failures: Vec<AssetFailure>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered with status {0}")]
    Status(u16),
}

/// Fetches the bytes behind a URL.
///
/// Implementations perform blocking I/O.
pub trait AssetFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// [`AssetFetcher`] over blocking HTTP GET.
///
/// One client (and its connection pool) is shared by every fetch made through this fetcher
/// and its clones.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    /// Built on the first fetch: a blocking client must not be created on an async runtime
    /// thread, and fetches always run on blocking threads.
    client: Arc<OnceLock<reqwest::blocking::Client>>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            client: Arc::new(OnceLock::new()),
        }
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, FetchError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        Ok(self.client.get_or_init(|| client))
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client()?.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Rewrites a Google Drive share or view link to its direct-download form.
///
/// Recognised forms are `/file/d/<ID>/...`, `/open?id=<ID>` and `/uc?id=<ID>`. Any other URL,
/// including one that does not parse, is returned unchanged.
pub fn normalise_url(raw: &str) -> String {
    match drive_file_id(raw) {
        Some(id) => format!("https://{DRIVE_HOST}/uc?export=download&id={id}"),
        None => raw.to_string(),
    }
}

fn drive_file_id(raw: &str) -> Option<String> {
    let url = reqwest::Url::parse(raw.trim()).ok()?;
    if url.host_str() != Some(DRIVE_HOST) {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    if let ["file", "d", id, ..] = segments.as_slice() {
        return Some((*id).to_string());
    }
    if matches!(segments.as_slice(), ["open"] | ["uc"]) {
        return url
            .query_pairs()
            .find(|(k, v)| k == "id" && !v.is_empty())
            .map(|(_, v)| v.into_owned());
    }
    None
}

/// Downloads every reference into `<session_dir>/<name>.png`.
///
/// Names are sanitised before they become file names, so two names can map to the same file
/// (`"sw tier"` and `"sw_tier"`). Later ones get a numeric suffix (`sw_tier_2.png`); the
/// comparison ignores ASCII case so the files stay distinct on case-insensitive filesystems.
///
/// # Arguments
///
/// * `fetcher` - Source of the image bytes.
/// * `files` - Session storage the assets are written into.
/// * `session` - Session that owns the assets.
/// * `references` - Assets to fetch, in embedding order.
///
/// # Returns
///
/// The stored assets in input order, plus one failure per skipped asset. This function
/// never fails as a whole.
pub fn resolve_assets(
    fetcher: &dyn AssetFetcher,
    files: &SessionFiles,
    session: &SessionId,
    references: &[AssetReference],
) -> ResolvedAssets {
    let mut resolved = ResolvedAssets::default();
    let mut taken = HashSet::new();

    for reference in references {
        let outcome = SessionId::sanitise(&reference.name)
            .map_err(|e| format!("invalid asset name: {e}"))
            .and_then(|stem| {
                let file_name = unique_file_name(stem.as_str(), &mut taken);
                resolve_one(fetcher, files, session, reference, &file_name)
            });
        match outcome {
            Ok(asset) => {
                tracing::debug!(session = %session, asset = %asset.name, path = %asset.path.display(), "Resolved asset");
                resolved.assets.push(asset);
            }
            Err(reason) => {
                tracing::warn!(session = %session, asset = %reference.name, reason = %reason, "Skipping asset");
                resolved
                    .failures
                    .push(AssetFailure::new(reference.name.clone(), reason));
            }
        }
    }

    tracing::info!(
        session = %session,
        resolved = resolved.assets.len(),
        skipped = resolved.failures.len(),
        "Resolved assets"
    );
    resolved
}

/// `<stem>.png`, or `<stem>_<n>.png` with the lowest `n >= 2` not already in `taken`.
fn unique_file_name(stem: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = format!("{stem}.png");
    let mut n = 2;
    while !taken.insert(candidate.to_ascii_lowercase()) {
        candidate = format!("{stem}_{n}.png");
        n += 1;
    }
    candidate
}

fn resolve_one(
    fetcher: &dyn AssetFetcher,
    files: &SessionFiles,
    session: &SessionId,
    reference: &AssetReference,
    file_name: &str,
) -> Result<LocalAsset, String> {
    let url = normalise_url(&reference.url);
    let bytes = fetcher
        .fetch(&url)
        .map_err(|e| format!("download from {url} failed: {e}"))?;
    let stored = files
        .write(session, file_name, &bytes)
        .map_err(|e| e.to_string())?;

    Ok(LocalAsset {
        name: reference.name.clone(),
        path: stored.path,
    })
}
