//! Adapters from wire payloads to typed requests.
//!
//! The assessment endpoint has accepted several payload shapes over time: sections nested
//! under `content_sections`/`slide_sections`, or flat top-level `content_<n>` and
//! `slide_<name>` keys. Everything is folded into one [`GenerateRequest`] here, so the pipeline
//! only ever sees the typed form.

use crate::assets::AssetReference;
use crate::constants::{slide_index, REPORT_SECTION_TITLES};
use crate::placeholders::value_to_text;
use crate::request::{GenerateRequest, IntakeRequest, ReportText};
use crate::validation::require_field;
use crate::{ReportError, ReportResult};
use api_shared::{GenerateAssessmentReq, GenerateIntakeReq};
use report_types::SessionId;
use serde_json::Value;
use std::collections::BTreeMap;

impl TryFrom<GenerateAssessmentReq> for GenerateRequest {
    type Error = ReportError;

    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` if `session_id`, `score_summary` or
    /// `recommendations` is missing, the session id is blank, or a content section key is not
    /// a section number.
    fn try_from(req: GenerateAssessmentReq) -> ReportResult<Self> {
        let session_id = SessionId::sanitise(require_field("session_id", as_text(req.session_id))?)?;
        let text = ReportText {
            email: as_text(req.email).unwrap_or_default(),
            score_summary: require_field("score_summary", as_text(req.score_summary))?,
            recommendations: require_field("recommendations", as_text(req.recommendations))?,
            key_findings: as_text(req.key_findings).unwrap_or_default(),
        };

        let mut content_sections = BTreeMap::new();
        for (key, value) in req.content_sections {
            let number = section_number(&key).ok_or_else(|| {
                ReportError::InvalidInput(format!(
                    "content_sections key {key:?} is not a section number between 1 and {}",
                    REPORT_SECTION_TITLES.len()
                ))
            })?;
            content_sections.insert(number, value_to_text(&value));
        }

        let mut slide_sections = BTreeMap::new();
        let mut fields = req.fields;
        for (name, value) in req.slide_sections {
            if slide_index(&name).is_some() {
                slide_sections.insert(name, value_to_text(&value));
            } else {
                fields.entry(format!("slide_{name}")).or_insert(value);
            }
        }

        for (key, value) in req.extra {
            if let Some(number) = key.strip_prefix("content_").and_then(section_number) {
                content_sections
                    .entry(number)
                    .or_insert_with(|| value_to_text(&value));
            } else if let Some(name) = key.strip_prefix("slide_").filter(|n| slide_index(n).is_some()) {
                slide_sections
                    .entry(name.to_string())
                    .or_insert_with(|| value_to_text(&value));
            } else {
                fields.entry(key).or_insert(value);
            }
        }

        let assets = req
            .charts
            .into_iter()
            .map(|(name, url)| AssetReference::new(name, url))
            .collect();

        Ok(Self {
            session_id,
            text,
            content_sections,
            slide_sections,
            fields,
            assets,
        })
    }
}

impl TryFrom<GenerateIntakeReq> for IntakeRequest {
    type Error = ReportError;

    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` if `session_id` is missing or blank.
    fn try_from(req: GenerateIntakeReq) -> ReportResult<Self> {
        let session_id = SessionId::sanitise(require_field("session_id", as_text(req.session_id))?)?;
        let answers = req.intake_answers;

        Ok(Self {
            session_id,
            email: as_text(req.email).unwrap_or_default(),
            selected_categories: answers.selected_categories,
            selected_programs: answers.selected_programs.into_iter().collect(),
            answers: [
                as_text(answers.q1).unwrap_or_default(),
                as_text(answers.q2).unwrap_or_default(),
                as_text(answers.q3).unwrap_or_default(),
                as_text(answers.q4).unwrap_or_default(),
                as_text(answers.q5).unwrap_or_default(),
            ],
        })
    }
}

/// Text of an optional wire value; numbers and booleans become their JSON text.
fn as_text(value: Option<Value>) -> Option<String> {
    value.map(|v| value_to_text(&v))
}

/// Section number from `"7"` or `"content_7"`, if within the report schema.
fn section_number(key: &str) -> Option<usize> {
    let digits = key.strip_prefix("content_").unwrap_or(key);
    digits
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=REPORT_SECTION_TITLES.len()).contains(n))
}
