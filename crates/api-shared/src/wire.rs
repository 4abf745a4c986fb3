//! Request and response bodies of the HTTP API.
//!
//! Request types mirror the JSON the service has always accepted, so every field is optional
//! at this layer; required fields are enforced by the payload adapters in `reportgen-core`.
//! Text fields take any JSON value and are converted to text by those adapters, so a numeric
//! `score_summary` is as valid as a string one.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of `POST /generate_assessment`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerateAssessmentReq {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub session_id: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub score_summary: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub recommendations: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub key_findings: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub email: Option<Value>,
    /// Chart name to image URL, embedded in this order.
    #[serde(default)]
    pub charts: IndexMap<String, String>,
    /// Report section number (`"1"`..`"20"`, or `"content_1"`) to section text.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub content_sections: BTreeMap<String, Value>,
    /// Slide section name (e.g. `"executive_summary"`) to section text.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub slide_sections: BTreeMap<String, Value>,
    /// Additional placeholder values; nested objects become dotted names.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub fields: BTreeMap<String, Value>,
    /// Any other top-level keys, such as legacy flat `content_<n>` fields.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: BTreeMap<String, Value>,
}

/// An asset that could not be fetched or embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedAsset {
    pub name: String,
    pub reason: String,
}

/// Synchronous-mode response of `POST /generate_assessment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerateAssessmentRes {
    pub session_id: String,
    pub docx_url: String,
    pub pptx_url: String,
    #[serde(default)]
    pub skipped_assets: Vec<SkippedAsset>,
}

/// Asynchronous-mode response of `POST /generate_assessment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AcceptedRes {
    pub session_id: String,
    pub status: String,
}

/// Answers collected by the intake form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IntakeAnswers {
    #[serde(default)]
    pub selected_categories: Vec<String>,
    /// Category to the programs selected in it.
    #[serde(default)]
    pub selected_programs: IndexMap<String, Vec<String>>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub q1: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub q2: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub q3: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub q4: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub q5: Option<Value>,
}

/// Body of `POST /generate_intake`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerateIntakeReq {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub session_id: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub email: Option<Value>,
    #[serde(default)]
    pub intake_answers: IntakeAnswers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerateIntakeRes {
    pub session_id: String,
    pub file_name: String,
    pub file_url: String,
}

/// Lifecycle of a background generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Accepted,
    Running,
    Completed,
    Failed,
}

/// Body of `GET /jobs/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobStatusRes {
    pub session_id: String,
    pub status: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docx_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pptx_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_assets: Vec<SkippedAsset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}
