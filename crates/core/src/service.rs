//! Report generation entry points.
//!
//! [`ReportService`] wires the pipeline together: placeholder map, asset download, merge,
//! embedding, then saving and publishing both artifacts. Each call loads its own template
//! instances; the only state shared between calls is the filesystem and the injected
//! collaborators.

use crate::assets::{resolve_assets, AssetFailure, AssetFetcher, HttpFetcher};
use crate::config::CoreConfig;
use crate::embed::embed_assets;
use crate::merge::{merge_deck, merge_document};
use crate::placeholders::{build_intake_placeholder_map, build_placeholder_map, PlaceholderMap};
use crate::request::{GenerateRequest, IntakeRequest};
use crate::session::{
    deck_file_name, document_file_name, intake_file_name, GeneratedArtifact, SessionOutput,
};
use crate::{ReportError, ReportResult};
use chrono::{NaiveDate, Utc};
use ooxml::{OoxmlError, TemplateDeck, TemplateDocument};
use report_types::SessionId;
use reportgen_drive::Uploader;
use reportgen_files::SessionFiles;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Outcome of a successful assessment generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedReport {
    pub session_id: SessionId,
    pub document: GeneratedArtifact,
    pub deck: GeneratedArtifact,
    /// Assets that could not be downloaded or embedded.
    pub skipped_assets: Vec<AssetFailure>,
}

/// Report generation service.
///
/// Cheap to clone; construct once at startup and share.
#[derive(Clone)]
pub struct ReportService {
    cfg: Arc<CoreConfig>,
    output: SessionOutput,
    fetcher: Arc<dyn AssetFetcher>,
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService")
            .field("cfg", &self.cfg)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl ReportService {
    /// Creates a service storing sessions under the configured root and fetching assets over
    /// HTTP.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Files` if the sessions directory cannot be created.
    pub fn new(cfg: Arc<CoreConfig>, uploader: Uploader) -> ReportResult<Self> {
        let files = SessionFiles::new(cfg.storage_root())?;
        let output = SessionOutput::new(files, uploader, cfg.public_base_url().map(str::to_string));
        let fetcher: Arc<dyn AssetFetcher> = Arc::new(HttpFetcher::new(cfg.fetch_timeout()));
        Ok(Self {
            cfg,
            output,
            fetcher,
        })
    }

    /// Replaces the asset fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn AssetFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn files(&self) -> &SessionFiles {
        self.output.files()
    }

    /// The validated placeholder map `generate` would apply for `request` today.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidInput` if a value contains placeholder syntax.
    pub fn placeholders(&self, request: &GenerateRequest) -> ReportResult<PlaceholderMap> {
        placeholder_map_for(request, today())
    }

    /// Generates the assessment document and executive deck for one session.
    ///
    /// Input is validated before anything is written. Asset and upload problems never fail
    /// the call: failed assets are listed in `skipped_assets` and failed uploads fall back to
    /// local locators.
    ///
    /// # Errors
    ///
    /// - `ReportError::InvalidInput` if a substitution value contains placeholder syntax
    /// - `ReportError::Template` if a template cannot be loaded
    /// - `ReportError::Document` if a merged artifact cannot be serialised
    /// - `ReportError::Files` if the session directory or an artifact cannot be written
    pub fn generate(&self, request: GenerateRequest) -> ReportResult<GeneratedReport> {
        let session = &request.session_id;
        tracing::info!(
            session = %session,
            assets = request.assets.len(),
            "Generating assessment report"
        );

        let map = placeholder_map_for(&request, today())?;
        let mut document = open_document(&self.cfg.document_template())?;
        let mut deck = open_deck(&self.cfg.deck_template())?;

        self.files().ensure_session_dir(session)?;
        let resolved = resolve_assets(self.fetcher.as_ref(), self.files(), session, &request.assets);

        merge_document(&mut document, &map)?;
        merge_deck(&mut deck, &map);

        let embed_failures =
            embed_assets(&mut document, &mut deck, &resolved.assets, &resolved.failures);
        let mut skipped_assets = resolved.failures;
        skipped_assets.extend(embed_failures);

        let document_bytes = document.to_bytes().map_err(document_error("document"))?;
        let deck_bytes = deck.to_bytes().map_err(document_error("deck"))?;
        let document = self
            .output
            .save(session, &document_file_name(session), &document_bytes)?;
        let deck = self.output.save(session, &deck_file_name(session), &deck_bytes)?;

        tracing::info!(
            session = %session,
            docx = %document.locator,
            pptx = %deck.locator,
            skipped = skipped_assets.len(),
            "Generated assessment report"
        );
        Ok(GeneratedReport {
            session_id: request.session_id.clone(),
            document,
            deck,
            skipped_assets,
        })
    }

    /// Generates the intake summary document for one session.
    ///
    /// Merges `session_id`, `email`, `date` and `q1`..`q5` into the intake template, then
    /// appends the selected programs (one bullet per category, nested bullets for its
    /// programs) and the five numbered answers.
    ///
    /// # Errors
    ///
    /// As [`Self::generate`]; a missing intake template is a `ReportError::Template`.
    pub fn generate_intake(&self, request: IntakeRequest) -> ReportResult<GeneratedArtifact> {
        let session = &request.session_id;
        tracing::info!(session = %session, "Generating intake document");

        let map = build_intake_placeholder_map(&request, today());
        map.validate()?;
        let mut document = open_document(&self.cfg.intake_template())?;

        merge_document(&mut document, &map)?;
        append_intake_summary(&mut document, &request).map_err(document_error("intake document"))?;

        let bytes = document
            .to_bytes()
            .map_err(document_error("intake document"))?;
        let artifact = self.output.save(session, &intake_file_name(session), &bytes)?;
        tracing::info!(session = %session, file = %artifact.locator, "Generated intake document");
        Ok(artifact)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn placeholder_map_for(request: &GenerateRequest, date: NaiveDate) -> ReportResult<PlaceholderMap> {
    let map = build_placeholder_map(request, date);
    map.validate()?;
    Ok(map)
}

fn open_document(path: &Path) -> ReportResult<TemplateDocument> {
    TemplateDocument::open(path).map_err(|source| ReportError::Template {
        path: path.to_path_buf(),
        source,
    })
}

fn open_deck(path: &Path) -> ReportResult<TemplateDeck> {
    TemplateDeck::open(path).map_err(|source| ReportError::Template {
        path: path.to_path_buf(),
        source,
    })
}

fn document_error(artifact: &'static str) -> impl Fn(OoxmlError) -> ReportError {
    move |source| ReportError::Document { artifact, source }
}

fn append_intake_summary(
    document: &mut TemplateDocument,
    request: &IntakeRequest,
) -> ooxml::OoxmlResult<()> {
    document.append_paragraph("Selected Programs", Some("Heading1"))?;
    for category in &request.selected_categories {
        document.append_paragraph(category, Some("ListBullet"))?;
        for program in request.programs_for(category) {
            document.append_paragraph(program, Some("ListBullet2"))?;
        }
    }

    document.append_paragraph("Transformation Questions", Some("Heading1"))?;
    for (i, answer) in request.answers.iter().enumerate() {
        document.append_paragraph(&format!("{}. {}", i + 1, answer), None)?;
    }
    Ok(())
}
