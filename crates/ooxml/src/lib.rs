//! Office Open XML templates.
//!
//! This crate loads `.docx` and `.pptx` packages into memory, replaces literal placeholder
//! tokens in their text-bearing nodes, and inserts pictures (as trailing pages, new slides, or
//! onto existing slides). It knows nothing about reports, sessions or HTTP; `reportgen-core`
//! drives it.
//!
//! ## Model
//!
//! ```text
//! Package            zip container, parts kept as raw bytes in archive order
//! └── XmlDocument    owned element tree for the parts that get edited
//!     ├── TemplateDocument  word/document.xml (+ headers/footers)
//!     └── TemplateDeck      ppt/presentation.xml + ppt/slides/slideN.xml
//! ```
//!
//! Element names are matched on their qualified form (`w:p`, `a:t`, `p:spTree`), which is the
//! prefix convention every Office producer writes.

mod docx;
mod picture;
mod package;
mod pptx;
mod rels;
mod text;
pub mod xml;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use docx::TemplateDocument;
pub use picture::{ImageFormat, ImageInfo};
pub use package::Package;
pub use pptx::TemplateDeck;

/// English Metric Units per inch, the unit DrawingML uses for offsets and extents.
pub const EMU_PER_INCH: u64 = 914_400;

/// Errors returned by the `ooxml` crate.
#[derive(Debug, thiserror::Error)]
pub enum OoxmlError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The zip container could not be read or written
    #[error("invalid package: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A part is not well-formed XML
    #[error("invalid XML in {part}: {message}")]
    Xml { part: String, message: String },

    /// A part required by the format is absent
    #[error("missing package part: {0}")]
    MissingPart(String),

    /// A part parsed but does not have the expected shape
    #[error("unexpected structure: {0}")]
    InvalidStructure(String),

    /// Image bytes are not a supported (PNG/JPEG) picture
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// A slide index beyond the end of the deck
    #[error("slide index {index} out of range (deck has {count} slides)")]
    SlideOutOfRange { index: usize, count: usize },
}

pub type OoxmlResult<T> = std::result::Result<T, OoxmlError>;
