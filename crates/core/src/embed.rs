//! Asset Embedder.
//!
//! Puts resolved assets into the merged templates. The document always gets one trailing page
//! per asset, titled after the asset. The deck either gets one new titled slide per asset
//! ([`EmbedPolicy::Append`]) or has each asset placed on the slide of the section it is named
//! after ([`EmbedPolicy::Positional`]). A picture that cannot be embedded is recorded and
//! skipped, and a "not found" notice takes its place wherever a new page or slide would have
//! held it.

use crate::assets::{AssetFailure, LocalAsset};
use crate::constants::{chart_title, slide_index};
use ooxml::{TemplateDeck, TemplateDocument};
use std::fs;

/// How assets are attached to the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPolicy {
    /// One new blank-layout slide per asset, in order.
    Append,
    /// Each asset onto the existing slide of its named section.
    Positional,
}

impl EmbedPolicy {
    /// Positional as soon as one asset is named after a known slide section.
    pub fn select(assets: &[LocalAsset]) -> Self {
        if assets.iter().any(|a| slide_index(&a.name).is_some()) {
            EmbedPolicy::Positional
        } else {
            EmbedPolicy::Append
        }
    }
}

/// Text left in an artifact where a chart could not be shown.
pub fn missing_chart_notice(title: &str) -> String {
    format!("⚠️ {title} chart not found.")
}

/// Embeds every asset into both templates, then leaves notices for assets that never
/// resolved.
///
/// # Arguments
///
/// * `document` - Merged document; receives one titled picture page per asset.
/// * `deck` - Merged deck; receives slides or placed pictures per the selected policy.
/// * `assets` - Resolved assets in resolution order.
/// * `unresolved` - Assets the resolver skipped; each gets a notice paragraph in the document
///   and, under the append policy, a notice slide in the deck.
///
/// # Returns
///
/// One failure per asset that could not be embedded in one of the templates. Positional
/// assets without a known section are not failures; they are simply not placed on a slide.
pub fn embed_assets(
    document: &mut TemplateDocument,
    deck: &mut TemplateDeck,
    assets: &[LocalAsset],
    unresolved: &[AssetFailure],
) -> Vec<AssetFailure> {
    let policy = EmbedPolicy::select(assets);
    tracing::debug!(?policy, assets = assets.len(), unresolved = unresolved.len(), "Embedding assets");

    let mut failures = Vec::new();
    for asset in assets {
        let title = chart_title(&asset.name);
        let bytes = match fs::read(&asset.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(asset = %asset.name, error = %e, "Cannot read asset");
                failures.push(AssetFailure::new(asset.name.clone(), e));
                leave_notices(document, deck, policy, &title);
                continue;
            }
        };

        if let Err(e) = document.append_picture_page(&asset.name, Some(&title), &bytes) {
            tracing::warn!(asset = %asset.name, error = %e, "Cannot embed asset in document");
            failures.push(AssetFailure::new(asset.name.clone(), format!("document: {e}")));
            document_notice(document, &title);
        }

        let placed = match policy {
            EmbedPolicy::Append => deck
                .append_picture_slide(&asset.name, Some(&title), &bytes)
                .map(Some),
            EmbedPolicy::Positional => match slide_index(&asset.name) {
                Some(index) => deck
                    .place_picture(index, &asset.name, &bytes)
                    .map(|()| Some(index)),
                None => {
                    tracing::info!(asset = %asset.name, "No slide section for asset; not placed");
                    Ok(None)
                }
            },
        };
        match placed {
            Ok(Some(index)) => tracing::debug!(asset = %asset.name, slide = index, "Embedded asset"),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(asset = %asset.name, error = %e, "Cannot embed asset in deck");
                failures.push(AssetFailure::new(asset.name.clone(), format!("deck: {e}")));
                if policy == EmbedPolicy::Append {
                    deck_notice(deck, &title);
                }
            }
        }
    }

    for skipped in unresolved {
        leave_notices(document, deck, policy, &chart_title(&skipped.name));
    }
    failures
}

fn leave_notices(
    document: &mut TemplateDocument,
    deck: &mut TemplateDeck,
    policy: EmbedPolicy,
    title: &str,
) {
    document_notice(document, title);
    if policy == EmbedPolicy::Append {
        deck_notice(deck, title);
    }
}

fn document_notice(document: &mut TemplateDocument, title: &str) {
    if let Err(e) = document.append_paragraph(&missing_chart_notice(title), None) {
        tracing::warn!(chart = title, error = %e, "Cannot add notice to document");
    }
}

fn deck_notice(deck: &mut TemplateDeck, title: &str) {
    if let Err(e) = deck.append_text_slide(Some(title), &missing_chart_notice(title)) {
        tracing::warn!(chart = title, error = %e, "Cannot add notice slide to deck");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ooxml::testing::{docx_with_paragraphs, png_bytes, pptx_with_slides};
    use std::path::Path;
    use tempfile::TempDir;

    fn asset(dir: &Path, name: &str, bytes: &[u8]) -> LocalAsset {
        let path = dir.join(format!("{name}.png"));
        fs::write(&path, bytes).unwrap();
        LocalAsset {
            name: name.to_string(),
            path,
        }
    }

    fn templates(slides: usize) -> (TemplateDocument, TemplateDeck) {
        let slide_texts: Vec<&[&str]> = (0..slides).map(|_| &["text"][..]).collect();
        (
            TemplateDocument::from_bytes(&docx_with_paragraphs(&["Report"])).unwrap(),
            TemplateDeck::from_bytes(&pptx_with_slides(&slide_texts)).unwrap(),
        )
    }

    #[test]
    fn test_policy_selection() {
        let temp = TempDir::new().unwrap();
        let chart = asset(temp.path(), "chart_a", b"x");
        let section = asset(temp.path(), "hw_tier_distribution", b"x");

        assert_eq!(EmbedPolicy::select(&[]), EmbedPolicy::Append);
        assert_eq!(EmbedPolicy::select(&[chart.clone()]), EmbedPolicy::Append);
        assert_eq!(EmbedPolicy::select(&[chart, section]), EmbedPolicy::Positional);
    }

    #[test]
    fn test_append_adds_one_page_and_one_slide_per_asset_in_order() {
        let temp = TempDir::new().unwrap();
        let assets = vec![
            asset(temp.path(), "first", &png_bytes(400, 300)),
            asset(temp.path(), "second", &png_bytes(200, 200)),
        ];
        let (mut doc, mut deck) = templates(2);

        let failures = embed_assets(&mut doc, &mut deck, &assets, &[]);

        assert!(failures.is_empty());
        assert_eq!(doc.page_break_count(), 2);
        assert_eq!(doc.picture_names(), vec!["first", "second"]);
        assert_eq!(deck.slide_count(), 4);
        assert_eq!(deck.picture_count(2).unwrap(), 1);
        assert_eq!(deck.picture_count(3).unwrap(), 1);
    }

    #[test]
    fn test_positional_places_on_section_slides() {
        let temp = TempDir::new().unwrap();
        let assets = vec![
            asset(temp.path(), "hw_tier_distribution", &png_bytes(400, 300)),
            asset(temp.path(), "unmapped", &png_bytes(400, 300)),
        ];
        let (mut doc, mut deck) = templates(12);

        let failures = embed_assets(&mut doc, &mut deck, &assets, &[]);

        assert!(failures.is_empty());
        assert_eq!(deck.slide_count(), 12);
        assert_eq!(deck.picture_count(4).unwrap(), 1);
        let placed: usize = (0..12).map(|i| deck.picture_count(i).unwrap()).sum();
        assert_eq!(placed, 1);
        assert_eq!(doc.picture_names(), vec!["hw_tier_distribution", "unmapped"]);
    }

    #[test]
    fn test_positional_index_past_deck_end_is_recorded() {
        let temp = TempDir::new().unwrap();
        let assets = vec![asset(temp.path(), "next_steps", &png_bytes(10, 10))];
        let (mut doc, mut deck) = templates(3);

        let failures = embed_assets(&mut doc, &mut deck, &assets, &[]);

        assert_eq!(failures.len(), 1);
        assert!(failures[0].reason.starts_with("deck:"));
        assert_eq!(doc.picture_names(), vec!["next_steps"]);
    }

    #[test]
    fn test_corrupt_asset_is_skipped_and_the_rest_embedded() {
        let temp = TempDir::new().unwrap();
        let assets = vec![
            asset(temp.path(), "broken", b"<html>not an image</html>"),
            asset(temp.path(), "good", &png_bytes(100, 50)),
        ];
        let (mut doc, mut deck) = templates(1);

        let failures = embed_assets(&mut doc, &mut deck, &assets, &[]);

        let failed: Vec<&str> = failures.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(failed, vec!["broken", "broken"]);
        assert_eq!(doc.picture_names(), vec!["good"]);
        assert!(doc.paragraph_texts().contains(&"⚠️ Broken chart not found.".to_string()));
        assert_eq!(deck.slide_count(), 3);
        assert_eq!(
            deck.slide_texts(1).unwrap(),
            vec!["Broken", "⚠️ Broken chart not found."]
        );
        assert_eq!(deck.picture_count(2).unwrap(), 1);
    }

    #[test]
    fn test_png_header_without_pixels_is_skipped() {
        let temp = TempDir::new().unwrap();
        let full = png_bytes(10, 10);
        let assets = vec![asset(temp.path(), "stub", &full[..33])];
        let (mut doc, mut deck) = templates(1);

        let failures = embed_assets(&mut doc, &mut deck, &assets, &[]);

        assert_eq!(failures.len(), 2);
        assert!(doc.picture_names().is_empty());
        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.picture_count(1).unwrap(), 0);
    }

    #[test]
    fn test_pages_and_slides_are_titled_after_the_asset() {
        let temp = TempDir::new().unwrap();
        let assets = vec![asset(temp.path(), "os_version_by_site", &png_bytes(40, 30))];
        let (mut doc, mut deck) = templates(1);

        let failures = embed_assets(&mut doc, &mut deck, &assets, &[]);

        assert!(failures.is_empty());
        assert!(doc
            .paragraph_texts()
            .contains(&"OS Version by Site".to_string()));
        assert_eq!(deck.slide_texts(1).unwrap(), vec!["OS Version by Site"]);
    }

    #[test]
    fn test_unresolved_assets_leave_notices() {
        let temp = TempDir::new().unwrap();
        let assets = vec![asset(temp.path(), "good", &png_bytes(40, 30))];
        let unresolved = vec![AssetFailure::new("sw_tier_distribution", "status 404")];
        let (mut doc, mut deck) = templates(1);

        let failures = embed_assets(&mut doc, &mut deck, &assets, &unresolved);

        assert!(failures.is_empty());
        let notice = "⚠️ SW Tier Distribution chart not found.".to_string();
        assert_eq!(doc.paragraph_texts().last(), Some(&notice));
        assert_eq!(deck.slide_count(), 3);
        assert_eq!(
            deck.slide_texts(2).unwrap(),
            vec!["SW Tier Distribution".to_string(), notice]
        );
    }

    #[test]
    fn test_positional_policy_leaves_deck_without_notice_slides() {
        let temp = TempDir::new().unwrap();
        let assets = vec![asset(temp.path(), "hw_tier_distribution", &png_bytes(40, 30))];
        let unresolved = vec![AssetFailure::new("sw_tier_distribution", "timed out")];
        let (mut doc, mut deck) = templates(12);

        embed_assets(&mut doc, &mut deck, &assets, &unresolved);

        assert_eq!(deck.slide_count(), 12);
        assert!(doc
            .paragraph_texts()
            .contains(&"⚠️ SW Tier Distribution chart not found.".to_string()));
    }

    #[test]
    fn test_chart_titles() {
        assert_eq!(chart_title("hw_tier_distribution"), "HW Tier Distribution");
        assert_eq!(chart_title("hw_device_type_vs_tier"), "HW Device Type vs Tier");
        assert_eq!(chart_title("sw-environment distribution"), "SW Environment Distribution");
        assert_eq!(chart_title("and_more"), "And More");
    }

    #[test]
    fn test_missing_asset_file_is_recorded() {
        let temp = TempDir::new().unwrap();
        let assets = vec![LocalAsset {
            name: "gone".into(),
            path: temp.path().join("gone.png"),
        }];
        let (mut doc, mut deck) = templates(1);

        let failures = embed_assets(&mut doc, &mut deck, &assets, &[]);
        assert_eq!(failures.len(), 1);
        assert!(doc.picture_names().is_empty());
        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.picture_count(1).unwrap(), 0);
    }
}
