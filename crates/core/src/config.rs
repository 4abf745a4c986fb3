//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    DECK_TEMPLATE_NAME, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_JOBS, DEFAULT_STORAGE_ROOT,
    DOCUMENT_TEMPLATE_NAME, INTAKE_TEMPLATE_NAME, TEMPLATE_DIR_NAME,
};
use crate::{ReportError, ReportResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// How `POST /generate_assessment` answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Generate before responding; the response carries the locators.
    #[default]
    Sync,
    /// Respond `202 Accepted` at once and generate on a bounded background worker.
    Async,
}

impl FromStr for GenerationMode {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(GenerationMode::Sync),
            "async" => Ok(GenerationMode::Async),
            other => Err(ReportError::Config(format!(
                "unknown generation mode {other:?} (expected \"sync\" or \"async\")"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone)]
pub struct CoreConfig {
    storage_root: PathBuf,
    template_dir: PathBuf,
    mode: GenerationMode,
    max_jobs: usize,
    public_base_url: Option<String>,
    fetch_timeout: Duration,
    drive_access_token: Option<String>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("storage_root", &self.storage_root)
            .field("template_dir", &self.template_dir)
            .field("mode", &self.mode)
            .field("max_jobs", &self.max_jobs)
            .field("public_base_url", &self.public_base_url)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("drive_uploads", &self.drive_access_token.is_some())
            .finish()
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Config` if `max_jobs` is zero.
    pub fn new(
        storage_root: PathBuf,
        template_dir: PathBuf,
        mode: GenerationMode,
        max_jobs: usize,
        public_base_url: Option<String>,
        fetch_timeout: Duration,
    ) -> ReportResult<Self> {
        if max_jobs == 0 {
            return Err(ReportError::Config("max_jobs must be at least 1".into()));
        }

        Ok(Self {
            storage_root,
            template_dir,
            mode,
            max_jobs,
            public_base_url: public_base_url_from_env_value(public_base_url),
            fetch_timeout,
            drive_access_token: None,
        })
    }

    /// Sets the Drive access token; blank tokens leave uploads disabled.
    pub fn with_drive_access_token(mut self, token: Option<String>) -> Self {
        self.drive_access_token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    /// Resolves the configuration from the process environment.
    ///
    /// Call once at startup. `storage_root` and `template_dir` take precedence over
    /// `REPORTGEN_ROOT` and `REPORTGEN_TEMPLATE_DIR`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Config` if a variable is malformed or no template directory can be
    /// found.
    pub fn from_env(
        storage_root: Option<PathBuf>,
        template_dir: Option<PathBuf>,
    ) -> ReportResult<Self> {
        let storage_root = storage_root
            .or_else(|| std::env::var("REPORTGEN_ROOT").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT));
        let template_override = template_dir.or_else(|| {
            std::env::var("REPORTGEN_TEMPLATE_DIR")
                .ok()
                .map(PathBuf::from)
        });
        let template_dir = resolve_template_dir(template_override)?;

        let cfg = Self::new(
            storage_root,
            template_dir,
            generation_mode_from_env_value(std::env::var("REPORTGEN_MODE").ok())?,
            max_jobs_from_env_value(std::env::var("REPORTGEN_MAX_JOBS").ok())?,
            std::env::var("REPORTGEN_PUBLIC_BASE_URL").ok(),
            fetch_timeout_from_env_value(std::env::var("REPORTGEN_FETCH_TIMEOUT_SECS").ok())?,
        )?;
        Ok(cfg.with_drive_access_token(std::env::var("GOOGLE_DRIVE_ACCESS_TOKEN").ok()))
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn document_template(&self) -> PathBuf {
        self.template_dir.join(DOCUMENT_TEMPLATE_NAME)
    }

    pub fn deck_template(&self) -> PathBuf {
        self.template_dir.join(DECK_TEMPLATE_NAME)
    }

    pub fn intake_template(&self) -> PathBuf {
        self.template_dir.join(INTAKE_TEMPLATE_NAME)
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    pub fn max_jobs(&self) -> usize {
        self.max_jobs
    }

    /// Prefix for local locators, without a trailing slash.
    pub fn public_base_url(&self) -> Option<&str> {
        self.public_base_url.as_deref()
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub fn drive_access_token(&self) -> Option<&str> {
        self.drive_access_token.as_deref()
    }
}

/// Resolve the template directory without reading environment variables.
///
/// If `override_dir` is provided, it must be a directory. Otherwise this searches for
/// `templates/` holding the assessment document template relative to the current working
/// directory and then walks up from `CARGO_MANIFEST_DIR`.
pub fn resolve_template_dir(override_dir: Option<PathBuf>) -> ReportResult<PathBuf> {
    fn looks_like_template_dir(path: &Path) -> bool {
        path.join(DOCUMENT_TEMPLATE_NAME).is_file()
    }

    if let Some(template_dir) = override_dir {
        if template_dir.is_dir() {
            return Ok(template_dir);
        }
        return Err(ReportError::Config(format!(
            "REPORTGEN_TEMPLATE_DIR override is not a directory: {}",
            template_dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(TEMPLATE_DIR_NAME);
    if looks_like_template_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(TEMPLATE_DIR_NAME);
        if looks_like_template_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ReportError::Config(format!(
        "could not locate {TEMPLATE_DIR_NAME}/ directory containing {DOCUMENT_TEMPLATE_NAME}"
    )))
}

/// Validate that the assessment templates exist and are readable Office packages.
///
/// This is intended to be run at startup so a broken deployment fails fast. The intake
/// template is only checked when a request needs it.
pub fn validate_templates(template_dir: &Path) -> ReportResult<()> {
    for name in [DOCUMENT_TEMPLATE_NAME, DECK_TEMPLATE_NAME] {
        let path = template_dir.join(name);
        let metadata = std::fs::symlink_metadata(&path).map_err(|e| {
            ReportError::Config(format!("template {} is not readable: {}", path.display(), e))
        })?;
        if !metadata.file_type().is_file() {
            return Err(ReportError::Config(format!(
                "template {} is not a regular file",
                path.display()
            )));
        }
        ooxml::Package::open(&path).map_err(|source| ReportError::Template {
            path: path.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Parse the generation mode from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`GenerationMode::Sync`].
pub fn generation_mode_from_env_value(value: Option<String>) -> ReportResult<GenerationMode> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.parse())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse the background worker bound from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_JOBS`].
pub fn max_jobs_from_env_value(value: Option<String>) -> ReportResult<usize> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_MAX_JOBS);
    };
    match value.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ReportError::Config(format!(
            "REPORTGEN_MAX_JOBS must be a positive integer, got {value:?}"
        ))),
    }
}

/// Parse the fetch timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_FETCH_TIMEOUT_SECS`].
pub fn fetch_timeout_from_env_value(value: Option<String>) -> ReportResult<Duration> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
    };
    match value.parse::<u64>() {
        Ok(secs) if secs >= 1 => Ok(Duration::from_secs(secs)),
        _ => Err(ReportError::Config(format!(
            "REPORTGEN_FETCH_TIMEOUT_SECS must be a positive integer, got {value:?}"
        ))),
    }
}

/// Normalise the public base URL: trimmed, without trailing slashes, `None` when blank.
pub fn public_base_url_from_env_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
}
