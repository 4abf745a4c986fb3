//! # API Shared
//!
//! Shared definitions for the report generator's outer surfaces.
//!
//! Contains:
//! - Wire types for requests and responses (`wire` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`, `reportgen-cli` and the payload adapters in `reportgen-core`.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
