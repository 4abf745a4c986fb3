//! Typed inputs of the generation entry points.
//!
//! These are built from wire payloads by the adapters in [`crate::payload`]; once constructed,
//! required fields are present and the session id is already sanitised.

use crate::assets::AssetReference;
use report_types::SessionId;
use std::collections::BTreeMap;

/// Fixed text fields of an assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportText {
    pub email: String,
    pub score_summary: String,
    pub recommendations: String,
    pub key_findings: String,
}

/// Input of [`ReportService::generate`](crate::ReportService::generate).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub session_id: SessionId,
    pub text: ReportText,
    /// Section number (1-based) to section text.
    pub content_sections: BTreeMap<usize, String>,
    /// Slide section name to text.
    pub slide_sections: BTreeMap<String, String>,
    /// Open-ended extra placeholder values.
    pub fields: BTreeMap<String, serde_json::Value>,
    /// Images to embed, in embedding order.
    pub assets: Vec<AssetReference>,
}

impl GenerateRequest {
    /// A request with only the session id set.
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            text: ReportText::default(),
            content_sections: BTreeMap::new(),
            slide_sections: BTreeMap::new(),
            fields: BTreeMap::new(),
            assets: Vec::new(),
        }
    }
}

/// Input of [`ReportService::generate_intake`](crate::ReportService::generate_intake).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeRequest {
    pub session_id: SessionId,
    pub email: String,
    pub selected_categories: Vec<String>,
    /// Category to its selected programs, in selection order.
    pub selected_programs: Vec<(String, Vec<String>)>,
    /// Answers to the five transformation questions.
    pub answers: [String; 5],
}

impl IntakeRequest {
    /// Programs selected under `category`.
    pub fn programs_for(&self, category: &str) -> &[String] {
        self.selected_programs
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, programs)| programs.as_slice())
            .unwrap_or_default()
    }
}
