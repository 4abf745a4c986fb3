use std::path::PathBuf;

/// Errors raised by the report pipeline.
///
/// Asset and upload failures never appear here; they are absorbed where they happen and
/// reported as skipped assets or local locators instead.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("template {path}: {source}", path = path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: ooxml::OoxmlError,
    },

    #[error("failed to build {artifact}: {source}")]
    Document {
        artifact: &'static str,
        #[source]
        source: ooxml::OoxmlError,
    },

    #[error("file storage error: {0}")]
    Files(#[from] reportgen_files::FilesError),
}

impl ReportError {
    /// True for errors caused by the caller's input rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ReportError::InvalidInput(_))
    }
}

impl From<report_types::TextError> for ReportError {
    fn from(err: report_types::TextError) -> Self {
        ReportError::InvalidInput(err.to_string())
    }
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_input_errors_are_client_errors() {
        assert!(ReportError::InvalidInput("x".into()).is_client_error());
        assert!(!ReportError::Config("x".into()).is_client_error());
        assert!(!ReportError::Template {
            path: PathBuf::from("t.docx"),
            source: ooxml::OoxmlError::MissingPart("word/document.xml".into()),
        }
        .is_client_error());
    }

    #[test]
    fn test_template_error_names_path_and_cause() {
        let err = ReportError::Template {
            path: PathBuf::from("templates/t.docx"),
            source: ooxml::OoxmlError::MissingPart("word/document.xml".into()),
        };
        let message = err.to_string();
        assert!(message.contains("templates/t.docx"));
        assert!(message.contains("word/document.xml"));
    }
}
