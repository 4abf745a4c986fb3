//! Input validation utilities.
//!
//! This module contains functions for validating caller input at the boundary, before any
//! directory is created or file is written.

use crate::constants::TOKEN_OPEN;
use crate::{ReportError, ReportResult};

/// Returns the value of a required text field.
///
/// Present-but-empty values are accepted; only an absent field is an error.
///
/// # Errors
///
/// Returns `ReportError::InvalidInput` naming `field` if `value` is `None`.
pub fn require_field(field: &str, value: Option<String>) -> ReportResult<String> {
    value.ok_or_else(|| ReportError::InvalidInput(format!("{field} is required")))
}

/// Validates that no substitution value contains placeholder syntax.
///
/// Replacement is literal and single-pass, so a value carrying `{{` could leave a token-like
/// string in the output or be mistaken for a placeholder by a later merge.
///
/// # Arguments
///
/// * `entries` - Token and value pairs to check.
///
/// # Errors
///
/// Returns `ReportError::InvalidInput` naming the first offending token.
pub fn validate_substitution_values(entries: &[(String, String)]) -> ReportResult<()> {
    match entries.iter().find(|(_, value)| value.contains(TOKEN_OPEN)) {
        Some((token, _)) => Err(ReportError::InvalidInput(format!(
            "value for {token} must not contain \"{TOKEN_OPEN}\""
        ))),
        None => Ok(()),
    }
}
