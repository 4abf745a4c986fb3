//! Placeholder Map Builder.
//!
//! Turns a [`GenerateRequest`] into the flat, ordered token → value list the merger applies.
//! Every token the report schema knows about is always present; a field the caller left out
//! maps to the empty string so no `{{ token }}` text survives in the output.

use crate::constants::{REPORT_SECTION_TITLES, SLIDE_SECTIONS};
use crate::request::{GenerateRequest, IntakeRequest};
use crate::validation::validate_substitution_values;
use crate::ReportResult;
use chrono::NaiveDate;
use serde_json::Value;

/// Ordered mapping from placeholder token (`{{ name }}`) to substitution value.
///
/// Keys are unique; inserting an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The token for placeholder `name`.
    pub fn token(name: &str) -> String {
        format!("{{{{ {name} }}}}")
    }

    /// Sets the value of placeholder `name`.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let token = Self::token(name);
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == token) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((token, value)),
        }
    }

    /// Sets `name` only if it has no value yet.
    fn insert_if_absent(&mut self, name: &str, value: impl Into<String>) {
        if !self.contains(name) {
            self.insert(name, value);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Value of placeholder `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let token = Self::token(name);
        self.entries
            .iter()
            .find(|(t, _)| *t == token)
            .map(|(_, v)| v.as_str())
    }

    /// Token and value pairs, in insertion order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rejects values that contain placeholder syntax.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` naming the offending token.
    pub fn validate(&self) -> ReportResult<()> {
        validate_substitution_values(&self.entries)
    }
}

/// The table of contents: every fixed report section as `"<n>. <title>"`, one per line.
///
/// The listing always covers the whole schema, whether or not a section has content.
pub fn table_of_contents() -> String {
    REPORT_SECTION_TITLES
        .iter()
        .enumerate()
        .map(|(i, title)| format!("{}. {}", i + 1, title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the placeholder map for an assessment.
///
/// Order: core fields, `date`, `table_of_contents`, `content_1..content_20`, the
/// `slide_<name>` family, then any extra fields (which never override a schema token).
pub fn build_placeholder_map(request: &GenerateRequest, date: NaiveDate) -> PlaceholderMap {
    let mut map = PlaceholderMap::new();

    map.insert("session_id", request.session_id.as_str());
    map.insert("email", request.text.email.as_str());
    map.insert("score_summary", request.text.score_summary.as_str());
    map.insert("recommendations", request.text.recommendations.as_str());
    map.insert("key_findings", request.text.key_findings.as_str());
    map.insert("date", date.format("%Y-%m-%d").to_string());
    map.insert("table_of_contents", table_of_contents());

    for n in 1..=REPORT_SECTION_TITLES.len() {
        let value = request
            .content_sections
            .get(&n)
            .map(String::as_str)
            .unwrap_or_default();
        map.insert(&format!("content_{n}"), value);
    }

    for (name, _) in SLIDE_SECTIONS {
        let value = request
            .slide_sections
            .get(name)
            .map(String::as_str)
            .unwrap_or_default();
        map.insert(&format!("slide_{name}"), value);
    }
    for (name, value) in &request.slide_sections {
        map.insert_if_absent(&format!("slide_{name}"), value.as_str());
    }

    let mut extra = Vec::new();
    for (key, value) in &request.fields {
        flatten_value(key, value, &mut extra);
    }
    for (name, value) in extra {
        map.insert_if_absent(&name, value);
    }

    map
}

/// Builds the placeholder map for an intake document.
pub fn build_intake_placeholder_map(request: &IntakeRequest, date: NaiveDate) -> PlaceholderMap {
    let mut map = PlaceholderMap::new();
    map.insert("session_id", request.session_id.as_str());
    map.insert("email", request.email.as_str());
    map.insert("date", date.format("%Y-%m-%d").to_string());
    for (i, answer) in request.answers.iter().enumerate() {
        map.insert(&format!("q{}", i + 1), answer.as_str());
    }
    map
}

/// Text form of a scalar JSON value: strings as-is, `null` as empty, others as JSON text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// Flattens nested objects into dotted names (`contact.name`); arrays join with newlines.
fn flatten_value(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(fields) => {
            for (key, nested) in fields {
                flatten_value(&format!("{prefix}.{key}"), nested, out);
            }
        }
        other => out.push((prefix.to_string(), value_to_text(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_types::SessionId;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn request() -> GenerateRequest {
        GenerateRequest::new(SessionId::sanitise("S1").unwrap())
    }

    #[test]
    fn test_token_syntax() {
        assert_eq!(PlaceholderMap::token("content_1"), "{{ content_1 }}");
    }

    #[test]
    fn test_every_schema_token_is_present_when_input_is_empty() {
        let map = build_placeholder_map(&request(), date());

        for name in ["email", "score_summary", "recommendations", "key_findings"] {
            assert_eq!(map.get(name), Some(""), "{name}");
        }
        for n in 1..=20 {
            assert_eq!(map.get(&format!("content_{n}")), Some(""));
        }
        for (name, _) in SLIDE_SECTIONS {
            assert_eq!(map.get(&format!("slide_{name}")), Some(""));
        }
        assert_eq!(map.get("session_id"), Some("S1"));
        assert_eq!(map.get("date"), Some("2025-03-14"));
    }

    #[test]
    fn test_table_of_contents_lists_every_section() {
        let mut req = request();
        req.content_sections.insert(3, "only this one".into());
        let map = build_placeholder_map(&req, date());

        let toc = map.get("table_of_contents").unwrap();
        let lines: Vec<&str> = toc.lines().collect();
        assert_eq!(lines.len(), REPORT_SECTION_TITLES.len());
        assert_eq!(lines[0], "1. Executive Summary");
        assert_eq!(lines[19], "20. Roadmap and Next Steps");
        assert_eq!(toc, table_of_contents());
    }

    #[test]
    fn test_sections_fill_their_tokens() {
        let mut req = request();
        req.content_sections.insert(19, "do X".into());
        req.slide_sections
            .insert("executive_summary".into(), "summary".into());
        req.slide_sections.insert("appendix".into(), "extra".into());
        let map = build_placeholder_map(&req, date());

        assert_eq!(map.get("content_19"), Some("do X"));
        assert_eq!(map.get("slide_executive_summary"), Some("summary"));
        assert_eq!(map.get("slide_appendix"), Some("extra"));
    }

    #[test]
    fn test_extra_fields_are_flattened_and_coerced() {
        let mut req = request();
        req.fields.insert(
            "contact".into(),
            serde_json::json!({"name": "Ada", "phone": null}),
        );
        req.fields.insert("score".into(), serde_json::json!(72.5));
        req.fields.insert("approved".into(), serde_json::json!(true));
        req.fields
            .insert("sites".into(), serde_json::json!(["London", "Leeds"]));
        let map = build_placeholder_map(&req, date());

        assert_eq!(map.get("contact.name"), Some("Ada"));
        assert_eq!(map.get("contact.phone"), Some(""));
        assert_eq!(map.get("score"), Some("72.5"));
        assert_eq!(map.get("approved"), Some("true"));
        assert_eq!(map.get("sites"), Some("London\nLeeds"));
    }

    #[test]
    fn test_extra_fields_do_not_override_schema_tokens() {
        let mut req = request();
        req.text.score_summary = "real".into();
        req.fields
            .insert("score_summary".into(), serde_json::json!("shadow"));
        let map = build_placeholder_map(&req, date());
        assert_eq!(map.get("score_summary"), Some("real"));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = PlaceholderMap::new();
        map.insert("a", "1");
        map.insert("b", "2");
        map.insert("a", "3");
        assert_eq!(
            map.entries(),
            &[
                ("{{ a }}".to_string(), "3".to_string()),
                ("{{ b }}".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_validate_rejects_token_in_value() {
        let mut req = request();
        req.text.recommendations = "see {{ content_1 }}".into();
        let map = build_placeholder_map(&req, date());
        assert!(map.validate().unwrap_err().is_client_error());
    }

    #[test]
    fn test_intake_map() {
        let req = IntakeRequest {
            session_id: SessionId::sanitise("S2").unwrap(),
            email: "a@b.c".into(),
            selected_categories: Vec::new(),
            selected_programs: Vec::new(),
            answers: [
                "one".into(),
                "two".into(),
                String::new(),
                String::new(),
                "five".into(),
            ],
        };
        let map = build_intake_placeholder_map(&req, date());
        assert_eq!(map.get("q1"), Some("one"));
        assert_eq!(map.get("q3"), Some(""));
        assert_eq!(map.get("q5"), Some("five"));
        assert_eq!(map.get("email"), Some("a@b.c"));
    }
}
