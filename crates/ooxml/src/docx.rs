//! WordprocessingML documents (`.docx`).

use crate::picture::ImageInfo;
use crate::package::Package;
use crate::rels::{self, Relationships, REL_IMAGE};
use crate::text::{self, Dialect};
use crate::xml::{self, Node, XmlDocument};
use crate::{OoxmlError, OoxmlResult};
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

/// Width of pictures appended to a document.
const PICTURE_WIDTH_INCHES: f64 = 5.5;

/// Paragraph style of the title above an appended picture.
const PICTURE_TITLE_STYLE: &str = "Heading3";

/// A `.docx` template loaded into memory and edited in place.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    package: Package,
    document: XmlDocument,
    next_drawing_id: u32,
}

impl TemplateDocument {
    /// Loads a document from disk.
    ///
    /// # Errors
    ///
    /// Returns an `OoxmlError` if the file cannot be read, is not a zip package, or has no
    /// well-formed `word/document.xml` with a `w:body`.
    pub fn open(path: &Path) -> OoxmlResult<Self> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> OoxmlResult<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    fn from_package(package: Package) -> OoxmlResult<Self> {
        let document = package.xml(DOCUMENT_PART)?;
        if document.root.find("w:body").is_none() {
            return Err(OoxmlError::InvalidStructure(format!(
                "{DOCUMENT_PART} has no w:body"
            )));
        }

        let mut drawings = Vec::new();
        document.root.find_all("wp:docPr", &mut drawings);
        let next_drawing_id = drawings
            .iter()
            .filter_map(|e| e.attr("id").and_then(|id| id.parse::<u32>().ok()))
            .max()
            .unwrap_or(0)
            + 1;

        Ok(Self {
            package,
            document,
            next_drawing_id,
        })
    }

    /// Replaces placeholder tokens in the body (paragraphs and table cells) and in every
    /// header and footer part. Returns the number of occurrences replaced.
    pub fn replace_placeholders(&mut self, replacements: &[(String, String)]) -> OoxmlResult<usize> {
        let mut count =
            text::replace_placeholders(&mut self.document.root, Dialect::Word, replacements);

        let header_footer_parts: Vec<String> = self
            .package
            .part_names()
            .filter(|name| is_header_or_footer(name))
            .map(str::to_string)
            .collect();
        for part in header_footer_parts {
            let mut doc = self.package.xml(&part)?;
            let replaced = text::replace_placeholders(&mut doc.root, Dialect::Word, replacements);
            if replaced > 0 {
                self.package.set_xml(&part, &doc)?;
                count += replaced;
            }
        }

        Ok(count)
    }

    /// Text of every body paragraph (including those inside table cells), in order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        text::paragraph_texts(&self.document.root, Dialect::Word)
    }

    /// Body text with paragraphs joined by newlines.
    pub fn text(&self) -> String {
        self.paragraph_texts().join("\n")
    }

    /// Number of explicit page breaks in the body.
    pub fn page_break_count(&self) -> usize {
        let mut breaks = Vec::new();
        self.document.root.find_all("w:br", &mut breaks);
        breaks
            .iter()
            .filter(|b| b.attr("w:type") == Some("page"))
            .count()
    }

    /// Names (`wp:docPr/@name`) of the inline pictures in the body, in order.
    pub fn picture_names(&self) -> Vec<String> {
        let mut drawings = Vec::new();
        self.document.root.find_all("wp:docPr", &mut drawings);
        drawings
            .iter()
            .map(|e| e.attr("name").unwrap_or_default().to_string())
            .collect()
    }

    /// Appends a paragraph, optionally with a paragraph style id (e.g. `Heading1`).
    pub fn append_paragraph(&mut self, text: &str, style: Option<&str>) -> OoxmlResult<()> {
        self.append_to_body(xml::parse_fragment(&paragraph_xml(text, style))?)
    }

    /// Appends a new page holding the picture: a page break, an optional `Heading3` title,
    /// then the picture scaled to a fixed width.
    ///
    /// # Errors
    ///
    /// Returns `OoxmlError::UnsupportedImage` if `bytes` is not a PNG or JPEG picture that
    /// decodes. The document is left unchanged in that case.
    pub fn append_picture_page(
        &mut self,
        name: &str,
        title: Option<&str>,
        bytes: &[u8],
    ) -> OoxmlResult<()> {
        let info = ImageInfo::inspect(bytes)?;
        let media_part = self.add_media(name, bytes, &info)?;

        let mut rels = Relationships::load(&self.package, DOCUMENT_PART)?;
        let rel_id = rels.add(
            REL_IMAGE,
            &rels::relative_target(DOCUMENT_PART, &media_part),
        );
        rels.save(&mut self.package, DOCUMENT_PART)?;

        let (cx, cy) = info.extent_for_width_inches(PICTURE_WIDTH_INCHES);
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;

        let heading = title
            .map(|t| paragraph_xml(t, Some(PICTURE_TITLE_STYLE)))
            .unwrap_or_default();
        let fragment = format!(
            concat!(
                r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#,
                "{heading}",
                r#"<w:p><w:r><w:drawing>"#,
                r#"<wp:inline xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                r#"<wp:docPr id="{id}" name="{name}"/>"#,
                r#"<a:graphic xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">"#,
                r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline>"#,
                r#"</w:drawing></w:r></w:p>"#,
            ),
            heading = heading,
            cx = cx,
            cy = cy,
            id = id,
            name = xml::escape(name),
            rel = rel_id,
        );
        self.append_to_body(xml::parse_fragment(&fragment)?)
    }

    /// Serialises the document into `.docx` bytes.
    pub fn to_bytes(&self) -> OoxmlResult<Vec<u8>> {
        let document = self.document.to_bytes()?;
        self.package
            .to_bytes_with(&[(DOCUMENT_PART, document.as_slice())])
    }

    /// Writes the document to `path`.
    pub fn save(&self, path: &Path) -> OoxmlResult<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| {
            OoxmlError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write document {}: {}", path.display(), e),
            ))
        })
    }

    fn add_media(&mut self, name: &str, bytes: &[u8], info: &ImageInfo) -> OoxmlResult<String> {
        let ext = info.format.extension();
        let stem = media_stem(name);
        let part = (1..)
            .map(|n| format!("word/media/{stem}_{n}.{ext}"))
            .find(|candidate| !self.package.contains(candidate))
            .unwrap_or_else(|| format!("word/media/{stem}.{ext}"));
        self.package.set_part(&part, bytes.to_vec());
        rels::ensure_default_content_type(&mut self.package, ext, info.format.content_type())?;
        Ok(part)
    }

    /// Inserts nodes at the end of the body, ahead of the final section properties.
    fn append_to_body(&mut self, nodes: Vec<Node>) -> OoxmlResult<()> {
        let body = self
            .document
            .root
            .find_mut("w:body")
            .ok_or_else(|| OoxmlError::InvalidStructure(format!("{DOCUMENT_PART} has no w:body")))?;

        let position = body
            .children
            .iter()
            .rposition(|n| matches!(n, Node::Element(e) if e.name == "w:sectPr"))
            .unwrap_or(body.children.len());
        body.children.splice(position..position, nodes);
        Ok(())
    }
}

fn paragraph_xml(text: &str, style: Option<&str>) -> String {
    let properties = style
        .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{}"/></w:pPr>"#, xml::escape(s)))
        .unwrap_or_default();
    format!(
        r#"<w:p>{properties}<w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        xml::escape(text)
    )
}

fn is_header_or_footer(part: &str) -> bool {
    part.strip_prefix("word/")
        .is_some_and(|rest| {
            !rest.contains('/')
                && (rest.starts_with("header") || rest.starts_with("footer"))
                && rest.ends_with(".xml")
        })
}

/// A media file stem made only of `[A-Za-z0-9_-]`.
pub(crate) fn media_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{docx_with_body, docx_with_paragraphs, png_bytes};

    fn reps(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_replace_in_body_and_table() {
        let body = concat!(
            r#"<w:p><w:r><w:t>Session {{ session_id }}</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{ score_summary }}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        let mut doc = TemplateDocument::from_bytes(&docx_with_body(body)).unwrap();
        let n = doc
            .replace_placeholders(&reps(&[
                ("{{ session_id }}", "S1"),
                ("{{ score_summary }}", "ok"),
            ]))
            .unwrap();

        assert_eq!(n, 2);
        assert_eq!(doc.paragraph_texts(), vec!["Session S1", "ok"]);
    }

    #[test]
    fn test_replace_in_header_part() {
        let mut package = Package::from_bytes(&docx_with_paragraphs(&["body"])).unwrap();
        package.set_part(
            "word/header1.xml",
            br#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>{{ session_id }}</w:t></w:r></w:p></w:hdr>"#.to_vec(),
        );
        let mut doc = TemplateDocument::from_bytes(&package.to_bytes().unwrap()).unwrap();
        let n = doc
            .replace_placeholders(&reps(&[("{{ session_id }}", "S9")]))
            .unwrap();
        assert_eq!(n, 1);

        let saved = Package::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        let header = saved.xml("word/header1.xml").unwrap();
        assert_eq!(header.root.text(), "S9");
    }

    #[test]
    fn test_append_picture_page_adds_break_picture_and_media() {
        let mut doc = TemplateDocument::from_bytes(&docx_with_paragraphs(&["intro"])).unwrap();
        doc.append_picture_page("hw_tier", None, &png_bytes(400, 200)).unwrap();
        doc.append_picture_page("sw_tier", None, &png_bytes(400, 200)).unwrap();

        assert_eq!(doc.page_break_count(), 2);
        assert_eq!(doc.picture_names(), vec!["hw_tier", "sw_tier"]);

        let saved = Package::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert!(saved.contains("word/media/hw_tier_1.png"));
        assert!(saved.contains("word/media/sw_tier_1.png"));
        let rels = Relationships::load(&saved, DOCUMENT_PART).unwrap();
        assert_eq!(
            rels.entries()
                .iter()
                .filter(|r| r.rel_type == REL_IMAGE)
                .count(),
            2
        );
        let types = saved.xml(rels::CONTENT_TYPES_PART).unwrap();
        assert!(types
            .root
            .child_elements()
            .any(|e| e.attr("Extension") == Some("png")));
    }

    #[test]
    fn test_pictures_are_inserted_before_section_properties() {
        let mut doc = TemplateDocument::from_bytes(&docx_with_paragraphs(&["intro"])).unwrap();
        doc.append_picture_page("chart", Some("Chart"), &png_bytes(10, 10)).unwrap();

        let body = doc.document.root.find("w:body").unwrap();
        let last = body.child_elements().last().unwrap();
        assert_eq!(last.name, "w:sectPr");
    }

    #[test]
    fn test_corrupt_picture_leaves_document_unchanged() {
        let mut doc = TemplateDocument::from_bytes(&docx_with_paragraphs(&["intro"])).unwrap();
        let before = doc.to_bytes().unwrap();
        let err = doc.append_picture_page("broken", Some("Broken"), b"not a png").unwrap_err();
        assert!(matches!(err, OoxmlError::UnsupportedImage(_)));
        assert_eq!(doc.page_break_count(), 0);
        assert_eq!(doc.to_bytes().unwrap().len(), before.len());

        // A valid PNG header over missing pixel data is refused the same way.
        let header_only = &png_bytes(20, 20)[..33];
        assert!(doc.append_picture_page("cut", None, header_only).is_err());
        assert!(doc.picture_names().is_empty());
    }

    #[test]
    fn test_picture_page_title_precedes_picture() {
        let mut doc = TemplateDocument::from_bytes(&docx_with_paragraphs(&["intro"])).unwrap();
        doc.append_picture_page("hw_tier", Some("HW Tier Distribution"), &png_bytes(40, 20))
            .unwrap();

        assert_eq!(
            doc.paragraph_texts(),
            vec!["intro", "", "HW Tier Distribution", ""]
        );
        let style = doc.document.root.find("w:pStyle").unwrap();
        assert_eq!(style.attr("w:val"), Some(PICTURE_TITLE_STYLE));
    }

    #[test]
    fn test_append_paragraph_with_style() {
        let mut doc = TemplateDocument::from_bytes(&docx_with_paragraphs(&[])).unwrap();
        doc.append_paragraph("Selected Programs", Some("Heading1"))
            .unwrap();
        doc.append_paragraph("A & B", None).unwrap();

        assert_eq!(doc.paragraph_texts(), vec!["Selected Programs", "A & B"]);
        let style = doc.document.root.find("w:pStyle").unwrap();
        assert_eq!(style.attr("w:val"), Some("Heading1"));
    }

    #[test]
    fn test_saved_document_reopens() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("out.docx");
        let mut doc =
            TemplateDocument::from_bytes(&docx_with_paragraphs(&["{{ a }}"])).unwrap();
        doc.replace_placeholders(&reps(&[("{{ a }}", "done")]))
            .unwrap();
        doc.save(&path).unwrap();

        let reopened = TemplateDocument::open(&path).unwrap();
        assert_eq!(reopened.paragraph_texts(), vec!["done"]);
    }

    #[test]
    fn test_missing_document_part_is_an_error() {
        let mut package = Package::new();
        package.set_part("[Content_Types].xml", b"<Types/>".to_vec());
        let err = TemplateDocument::from_bytes(&package.to_bytes().unwrap()).unwrap_err();
        assert!(matches!(err, OoxmlError::MissingPart(_)));
    }

    #[test]
    fn test_header_footer_detection() {
        assert!(is_header_or_footer("word/header1.xml"));
        assert!(is_header_or_footer("word/footer2.xml"));
        assert!(!is_header_or_footer("word/_rels/header1.xml.rels"));
        assert!(!is_header_or_footer("word/document.xml"));
    }
}
