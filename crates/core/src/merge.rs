//! Template Merger.
//!
//! Applies a [`PlaceholderMap`] to both loaded templates. The paragraph walking itself lives in
//! the `ooxml` crate; this module fixes the order and logs what happened.

use crate::placeholders::PlaceholderMap;
use crate::{ReportError, ReportResult};
use ooxml::{TemplateDeck, TemplateDocument};

/// Replaces every token of `map` in the document body, headers and footers.
///
/// # Returns
///
/// The number of replacements made.
///
/// # Errors
///
/// Returns `ReportError::Document` if a header or footer part is not well-formed XML.
pub fn merge_document(document: &mut TemplateDocument, map: &PlaceholderMap) -> ReportResult<usize> {
    let count = document
        .replace_placeholders(map.entries())
        .map_err(|source| ReportError::Document {
            artifact: "document",
            source,
        })?;
    tracing::debug!(replacements = count, "Merged document placeholders");
    Ok(count)
}

/// Replaces every token of `map` on every slide, in presentation order.
pub fn merge_deck(deck: &mut TemplateDeck, map: &PlaceholderMap) -> usize {
    let count = deck.replace_placeholders(map.entries());
    tracing::debug!(replacements = count, slides = deck.slide_count(), "Merged deck placeholders");
    count
}
