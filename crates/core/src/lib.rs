//! # Report Generator Core
//!
//! Core business logic for generating assessment reports from office templates.
//!
//! This crate turns a typed request into two saved artifacts, a Word assessment report and a
//! PowerPoint executive deck:
//! - Placeholder map building (`{{ token }}` → text) with a fixed report schema
//! - Asset download into the session directory, with per-asset failure tolerance
//! - Template merging and picture embedding via the `ooxml` crate
//! - Saving, optional remote upload and locator construction
//!
//! **No API concerns**: HTTP servers, routing and request parsing belong in `api-rest`; the
//! only wire-facing code here is the payload adapter in [`payload`].
//!
//! ## Pipeline
//!
//! ```text
//! GenerateRequest
//!   → build_placeholder_map   (placeholders)
//!   → resolve_assets          (assets)      <root>/temp_sessions/<session>/<name>.png
//!   → merge_document/deck     (merge)
//!   → embed_assets            (embed)
//!   → SessionOutput::save     (session)     locator: remote URL or /files/<session>/<file>
//! ```

pub mod assets;
pub mod config;
pub mod constants;
pub mod embed;
mod error;
pub mod jobs;
pub mod merge;
pub mod payload;
pub mod placeholders;
pub mod request;
pub mod service;
pub mod session;
pub mod validation;

pub use assets::{AssetFailure, AssetFetcher, AssetReference, HttpFetcher, LocalAsset};
pub use config::{CoreConfig, GenerationMode};
pub use error::{ReportError, ReportResult};
pub use jobs::{JobStatus, JobStore, JobTicket};
pub use placeholders::PlaceholderMap;
pub use request::{GenerateRequest, IntakeRequest, ReportText};
pub use service::{GeneratedReport, ReportService};
pub use session::GeneratedArtifact;

pub use report_types::SessionId;
pub use reportgen_drive::Uploader;
