//! Constants used throughout the report generator core crate.
//!
//! This module contains template names, output naming and the fixed report schema (section
//! titles and slide positions) so they stay consistent across the pipeline.

/// Directory searched for templates when no explicit directory is configured.
pub const TEMPLATE_DIR_NAME: &str = "templates";

/// Word template for the assessment report.
pub const DOCUMENT_TEMPLATE_NAME: &str = "IT_Current_Status_Assesment_Template.docx";

/// Slide deck template for the executive report.
pub const DECK_TEMPLATE_NAME: &str = "IT_Infrastructure_Assessment_Report.pptx";

/// Word template for the intake form summary.
pub const INTAKE_TEMPLATE_NAME: &str = "intakeform.docx";

/// Stem of the generated assessment document: `<stem>_<session>.docx`.
pub const DOCUMENT_OUTPUT_STEM: &str = "IT_Current_Status_Assessment_Report";

/// Stem of the generated executive deck: `<stem>_<session>.pptx`.
pub const DECK_OUTPUT_STEM: &str = "IT_Current_Status_Executive_Report";

/// Stem of the generated intake document: `<stem>_<session>.docx`.
pub const INTAKE_OUTPUT_STEM: &str = "intake";

/// Default storage root when none is configured; sessions live under `<root>/temp_sessions`.
pub const DEFAULT_STORAGE_ROOT: &str = ".";

/// Default number of concurrent background generations.
pub const DEFAULT_MAX_JOBS: usize = 4;

/// Default timeout for asset downloads and remote uploads.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Route prefix under which session files are served.
pub const FILES_ROUTE_PREFIX: &str = "/files";

/// Opening delimiter of a placeholder token. Substitution values may not contain it.
pub const TOKEN_OPEN: &str = "{{";

/// Titles of the numbered report sections, in order. Section `n` fills `{{ content_n }}`.
pub const REPORT_SECTION_TITLES: [&str; 20] = [
    "Executive Summary",
    "Scope and Objectives",
    "Assessment Methodology",
    "Current IT Landscape",
    "Hardware Inventory",
    "Software Inventory",
    "Network Infrastructure",
    "Servers and Storage",
    "End-User Computing",
    "Cloud Services",
    "Security Posture",
    "Backup and Disaster Recovery",
    "IT Operations and Support",
    "Licensing and Compliance",
    "Lifecycle and Obsolescence",
    "Gap Analysis",
    "Risk Assessment",
    "Key Findings",
    "Recommendations",
    "Roadmap and Next Steps",
];

/// Named slide sections and the 0-based index of their slide in the executive deck.
///
/// Section `name` fills `{{ slide_<name> }}`; an asset with the same name is placed on that
/// slide.
pub const SLIDE_SECTIONS: [(&str, usize); 12] = [
    ("title", 0),
    ("executive_summary", 1),
    ("scope", 2),
    ("current_state", 3),
    ("hw_tier_distribution", 4),
    ("hw_environment_distribution", 5),
    ("hw_device_type_vs_tier", 6),
    ("sw_tier_distribution", 7),
    ("sw_environment_distribution", 8),
    ("key_findings", 9),
    ("recommendations", 10),
    ("next_steps", 11),
];

/// Slide index for a named slide section.
pub fn slide_index(section: &str) -> Option<usize> {
    SLIDE_SECTIONS
        .iter()
        .find(|(name, _)| *name == section)
        .map(|(_, index)| *index)
}

/// Words kept upper-case in chart titles.
const TITLE_ACRONYMS: [&str; 4] = ["hw", "sw", "it", "os"];

/// Words kept lower-case in chart titles.
const TITLE_LOWER_WORDS: [&str; 5] = ["vs", "and", "of", "by", "per"];

/// Display title for an asset name: `hw_device_type_vs_tier` becomes
/// `HW Device Type vs Tier`.
pub fn chart_title(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if TITLE_ACRONYMS.contains(&lower.as_str()) {
                lower.to_uppercase()
            } else if i > 0 && TITLE_LOWER_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                let mut chars = word.chars();
                chars
                    .next()
                    .map(|first| first.to_uppercase().chain(chars).collect())
                    .unwrap_or_default()
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
