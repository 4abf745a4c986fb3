//! PresentationML decks (`.pptx`).

use crate::docx::media_stem;
use crate::picture::ImageInfo;
use crate::package::Package;
use crate::rels::{self, Relationships, REL_IMAGE, REL_SLIDE, REL_SLIDE_LAYOUT};
use crate::text::{self, Dialect};
use crate::xml::{self, Element, Node, XmlDocument};
use crate::{OoxmlError, OoxmlResult, EMU_PER_INCH};
use std::path::Path;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const SLIDE_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Default 4:3 slide size, used when the presentation does not declare `p:sldSz`.
const DEFAULT_SLIDE_CX: u64 = 9_144_000;
const DEFAULT_SLIDE_CY: u64 = 6_858_000;

/// Picture placement on a slide: offset from the top-left corner and preferred width.
const PICTURE_LEFT: u64 = EMU_PER_INCH;
const PICTURE_TOP: u64 = EMU_PER_INCH * 3 / 2;
const PICTURE_WIDTH: u64 = EMU_PER_INCH * 7;

/// Title text box across the top of appended slides.
const TITLE_LEFT: u64 = EMU_PER_INCH / 2;
const TITLE_TOP: u64 = EMU_PER_INCH * 2 / 5;
const TITLE_HEIGHT: u64 = EMU_PER_INCH;
const TITLE_FONT_SIZE: u32 = 2800;

/// Notice text box on text-only slides.
const NOTICE_LEFT: u64 = EMU_PER_INCH;
const NOTICE_TOP: u64 = EMU_PER_INCH * 2;
const NOTICE_WIDTH: u64 = EMU_PER_INCH * 6;
const NOTICE_HEIGHT: u64 = EMU_PER_INCH;

/// Slide ids below this value are reserved.
const MIN_SLIDE_ID: u32 = 256;

#[derive(Debug, Clone)]
struct Slide {
    part: String,
    doc: XmlDocument,
}

/// A `.pptx` template loaded into memory and edited in place.
#[derive(Debug, Clone)]
pub struct TemplateDeck {
    package: Package,
    presentation: XmlDocument,
    slides: Vec<Slide>,
    slide_cx: u64,
    slide_cy: u64,
}

impl TemplateDeck {
    /// Loads a deck from disk.
    ///
    /// # Errors
    ///
    /// Returns an `OoxmlError` if the file is not a readable package, lacks
    /// `ppt/presentation.xml`, or references a slide part that does not exist.
    pub fn open(path: &Path) -> OoxmlResult<Self> {
        Self::from_package(Package::open(path)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> OoxmlResult<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    fn from_package(package: Package) -> OoxmlResult<Self> {
        let presentation = package.xml(PRESENTATION_PART)?;
        let rels = Relationships::load(&package, PRESENTATION_PART)?;

        let mut slides = Vec::new();
        if let Some(list) = presentation.root.find("p:sldIdLst") {
            for entry in list.child_elements().filter(|e| e.name == "p:sldId") {
                let rel_id = entry.attr("r:id").ok_or_else(|| {
                    OoxmlError::InvalidStructure("p:sldId without r:id".into())
                })?;
                let target = rels.target(rel_id).ok_or_else(|| {
                    OoxmlError::InvalidStructure(format!(
                        "slide relationship {rel_id} is not defined"
                    ))
                })?;
                let part = rels::resolve_target(PRESENTATION_PART, &target);
                let doc = package.xml(&part)?;
                slides.push(Slide { part, doc });
            }
        }

        let size = presentation.root.find("p:sldSz");
        let dimension = |key: &str, default: u64| {
            size.and_then(|s| s.attr(key))
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        let slide_cx = dimension("cx", DEFAULT_SLIDE_CX);
        let slide_cy = dimension("cy", DEFAULT_SLIDE_CY);

        Ok(Self {
            package,
            presentation,
            slides,
            slide_cx,
            slide_cy,
        })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Text of each paragraph on slide `index` (0-based).
    pub fn slide_texts(&self, index: usize) -> OoxmlResult<Vec<String>> {
        let slide = self.slide(index)?;
        Ok(text::paragraph_texts(&slide.doc.root, Dialect::Drawing))
    }

    /// Text of the whole deck, slide by slide, paragraphs joined by newlines.
    pub fn text(&self) -> String {
        self.slides
            .iter()
            .flat_map(|s| text::paragraph_texts(&s.doc.root, Dialect::Drawing))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replaces placeholder tokens on every slide (shapes, grouped shapes and table cells).
    /// Returns the number of occurrences replaced.
    pub fn replace_placeholders(&mut self, replacements: &[(String, String)]) -> usize {
        self.slides
            .iter_mut()
            .map(|s| text::replace_placeholders(&mut s.doc.root, Dialect::Drawing, replacements))
            .sum()
    }

    /// Number of pictures on slide `index`.
    pub fn picture_count(&self, index: usize) -> OoxmlResult<usize> {
        let slide = self.slide(index)?;
        let mut pictures = Vec::new();
        slide.doc.root.find_all("p:pic", &mut pictures);
        Ok(pictures.len())
    }

    /// Part name of the layout used by slide `index`.
    pub fn slide_layout(&self, index: usize) -> OoxmlResult<Option<String>> {
        let slide = self.slide(index)?;
        let rels = Relationships::load(&self.package, &slide.part)?;
        Ok(rels
            .entries()
            .into_iter()
            .find(|r| r.rel_type == REL_SLIDE_LAYOUT)
            .map(|r| rels::resolve_target(&slide.part, &r.target)))
    }

    /// Appends a slide built on the deck's blank layout and places the picture on it, under
    /// `title` when one is given. Returns the new slide's index.
    ///
    /// # Errors
    ///
    /// Returns `OoxmlError::UnsupportedImage` if `bytes` is not a PNG or JPEG picture that
    /// decodes, or `OoxmlError::InvalidStructure` if the deck has no slide layout at all. The
    /// deck is left unchanged in both cases.
    pub fn append_picture_slide(
        &mut self,
        name: &str,
        title: Option<&str>,
        bytes: &[u8],
    ) -> OoxmlResult<usize> {
        let info = ImageInfo::inspect(bytes)?;
        let index = self.push_blank_slide()?;
        if let Some(title) = title {
            self.add_title(index, title)?;
        }
        self.insert_picture(index, name, bytes, &info)?;
        Ok(index)
    }

    /// Appends a blank-layout slide carrying `text` in a text box, under `title` when one is
    /// given. Returns the new slide's index.
    ///
    /// # Errors
    ///
    /// Returns `OoxmlError::InvalidStructure` if the deck has no slide layout at all.
    pub fn append_text_slide(&mut self, title: Option<&str>, text: &str) -> OoxmlResult<usize> {
        let index = self.push_blank_slide()?;
        if let Some(title) = title {
            self.add_title(index, title)?;
        }
        let width = NOTICE_WIDTH.min(self.slide_cx.saturating_sub(NOTICE_LEFT)).max(1);
        self.add_text_box(
            index,
            "Notice",
            (NOTICE_LEFT, NOTICE_TOP, width, NOTICE_HEIGHT),
            text,
            None,
        )?;
        Ok(index)
    }

    /// Places the picture onto existing slide `index` (0-based).
    ///
    /// # Errors
    ///
    /// Returns `OoxmlError::SlideOutOfRange` if the deck has no such slide, or
    /// `OoxmlError::UnsupportedImage` if `bytes` is not a PNG or JPEG picture.
    pub fn place_picture(&mut self, index: usize, name: &str, bytes: &[u8]) -> OoxmlResult<()> {
        self.slide(index)?;
        let info = ImageInfo::inspect(bytes)?;
        self.insert_picture(index, name, bytes, &info)
    }

    /// Serialises the deck into `.pptx` bytes.
    pub fn to_bytes(&self) -> OoxmlResult<Vec<u8>> {
        let mut parts = Vec::with_capacity(self.slides.len() + 1);
        parts.push((PRESENTATION_PART.to_string(), self.presentation.to_bytes()?));
        for slide in &self.slides {
            parts.push((slide.part.clone(), slide.doc.to_bytes()?));
        }
        let overrides: Vec<(&str, &[u8])> = parts
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()))
            .collect();
        self.package.to_bytes_with(&overrides)
    }

    /// Writes the deck to `path`.
    pub fn save(&self, path: &Path) -> OoxmlResult<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| {
            OoxmlError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write deck {}: {}", path.display(), e),
            ))
        })
    }

    fn slide(&self, index: usize) -> OoxmlResult<&Slide> {
        self.slides.get(index).ok_or(OoxmlError::SlideOutOfRange {
            index,
            count: self.slides.len(),
        })
    }

    /// Picks the layout for new picture slides: a layout declared `type="blank"`, then one
    /// named "Blank", then the first slide's layout, then the first layout in the package.
    fn blank_layout(&self) -> OoxmlResult<String> {
        let mut layouts: Vec<&str> = self
            .package
            .part_names()
            .filter(|name| {
                name.strip_prefix("ppt/slideLayouts/")
                    .is_some_and(|rest| !rest.contains('/') && rest.ends_with(".xml"))
            })
            .collect();
        layouts.sort_by_key(|name| (name.len(), *name));

        let mut parsed = Vec::with_capacity(layouts.len());
        for name in &layouts {
            parsed.push((*name, self.package.xml(name)?));
        }

        if let Some((name, _)) = parsed
            .iter()
            .find(|(_, doc)| doc.root.attr("type") == Some("blank"))
        {
            return Ok(name.to_string());
        }
        if let Some((name, _)) = parsed.iter().find(|(_, doc)| {
            doc.root
                .child("p:cSld")
                .and_then(|c| c.attr("name"))
                .is_some_and(|n| n.eq_ignore_ascii_case("blank"))
        }) {
            return Ok(name.to_string());
        }
        if !self.slides.is_empty() {
            if let Some(layout) = self.slide_layout(0)? {
                return Ok(layout);
            }
        }
        layouts
            .first()
            .map(|name| name.to_string())
            .ok_or_else(|| OoxmlError::InvalidStructure("deck has no slide layouts".into()))
    }

    fn register_slide_id(&mut self, rel_id: &str) {
        let root = &mut self.presentation.root;
        if root.child("p:sldIdLst").is_none() {
            let position = root
                .children
                .iter()
                .position(|n| matches!(n, Node::Element(e) if e.name == "p:sldSz"))
                .or_else(|| {
                    root.children
                        .iter()
                        .position(|n| matches!(n, Node::Element(e) if e.name == "p:sldMasterIdLst"))
                        .map(|p| p + 1)
                })
                .unwrap_or(root.children.len());
            root.children
                .insert(position, Node::Element(Element::new("p:sldIdLst")));
        }

        if let Some(list) = root.child_mut("p:sldIdLst") {
            let next = list
                .child_elements()
                .filter_map(|e| e.attr("id").and_then(|id| id.parse::<u32>().ok()))
                .max()
                .map_or(MIN_SLIDE_ID, |max| (max + 1).max(MIN_SLIDE_ID));
            let mut entry = Element::new("p:sldId");
            entry.set_attr("id", next.to_string());
            entry.set_attr("r:id", rel_id);
            list.push(entry);
        }
    }

    /// Creates an empty slide on the blank layout, registers it with the presentation and
    /// returns its index.
    fn push_blank_slide(&mut self) -> OoxmlResult<usize> {
        let layout = self.blank_layout()?;

        let part = (1..)
            .map(|n| format!("ppt/slides/slide{n}.xml"))
            .find(|candidate| !self.package.contains(candidate))
            .unwrap_or_else(|| format!("ppt/slides/slide{}.xml", self.slides.len() + 1));
        tracing::debug!(slide = %part, layout = %layout, "Appending slide");

        let root = xml::parse_fragment(&format!(
            concat!(
                r#"<p:sld xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"><p:cSld><p:spTree>"#,
                r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
                r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
                r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#,
            ),
            a = A_NS,
            r = R_NS,
            p = P_NS,
        ))?
        .into_iter()
        .find_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
        .ok_or_else(|| OoxmlError::InvalidStructure("empty slide skeleton".into()))?;

        let mut slide_rels = Relationships::load(&self.package, &part)?;
        slide_rels.add(REL_SLIDE_LAYOUT, &rels::relative_target(&part, &layout));
        slide_rels.save(&mut self.package, &part)?;

        let doc = XmlDocument {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        };
        self.package.set_xml(&part, &doc)?;
        rels::ensure_override_content_type(&mut self.package, &part, SLIDE_CONTENT_TYPE)?;

        let mut presentation_rels = Relationships::load(&self.package, PRESENTATION_PART)?;
        let rel_id = presentation_rels.add(
            REL_SLIDE,
            &rels::relative_target(PRESENTATION_PART, &part),
        );
        presentation_rels.save(&mut self.package, PRESENTATION_PART)?;
        self.register_slide_id(&rel_id);

        self.slides.push(Slide { part, doc });
        Ok(self.slides.len() - 1)
    }

    fn add_title(&mut self, index: usize, title: &str) -> OoxmlResult<()> {
        let width = self.slide_cx.saturating_sub(2 * TITLE_LEFT).max(1);
        self.add_text_box(
            index,
            "Title",
            (TITLE_LEFT, TITLE_TOP, width, TITLE_HEIGHT),
            title,
            Some(TITLE_FONT_SIZE),
        )
    }

    /// Adds a text box at `(x, y, cx, cy)` in EMU holding one paragraph. `font_size` is in
    /// hundredths of a point; titles are bold.
    fn add_text_box(
        &mut self,
        index: usize,
        name: &str,
        (x, y, cx, cy): (u64, u64, u64, u64),
        text: &str,
        font_size: Option<u32>,
    ) -> OoxmlResult<()> {
        let run_properties = match font_size {
            Some(size) => format!(r#"<a:rPr lang="en-US" sz="{size}" b="1" dirty="0"/>"#),
            None => r#"<a:rPr lang="en-US" dirty="0"/>"#.to_string(),
        };
        let slide = &mut self.slides[index];
        let shape_id = next_shape_id(&slide.doc.root);
        let shape = xml::parse_fragment(&format!(
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name} {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
                r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
                r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#,
                r#"<a:p><a:r>{rpr}<a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#,
            ),
            id = shape_id,
            name = xml::escape(name),
            x = x,
            y = y,
            cx = cx,
            cy = cy,
            rpr = run_properties,
            text = xml::escape(text),
        ))?;

        let tree = slide.doc.root.find_mut("p:spTree").ok_or_else(|| {
            OoxmlError::InvalidStructure(format!("{} has no p:spTree", slide.part))
        })?;
        tree.children.extend(shape);
        Ok(())
    }

    fn insert_picture(
        &mut self,
        index: usize,
        name: &str,
        bytes: &[u8],
        info: &ImageInfo,
    ) -> OoxmlResult<()> {
        let ext = info.format.extension();
        let stem = media_stem(name);
        let media_part = (1..)
            .map(|n| format!("ppt/media/{stem}_{n}.{ext}"))
            .find(|candidate| !self.package.contains(candidate))
            .unwrap_or_else(|| format!("ppt/media/{stem}.{ext}"));
        self.package.set_part(&media_part, bytes.to_vec());
        rels::ensure_default_content_type(&mut self.package, ext, info.format.content_type())?;

        let slide_part = self.slides[index].part.clone();
        let mut slide_rels = Relationships::load(&self.package, &slide_part)?;
        let rel_id = slide_rels.add(REL_IMAGE, &rels::relative_target(&slide_part, &media_part));
        slide_rels.save(&mut self.package, &slide_part)?;

        let max_cx = PICTURE_WIDTH.min(self.slide_cx.saturating_sub(PICTURE_LEFT)).max(1);
        let max_cy = self.slide_cy.saturating_sub(PICTURE_TOP).max(1);
        let (cx, cy) = info.fit(max_cx, max_cy);

        let slide = &mut self.slides[index];
        let shape_id = next_shape_id(&slide.doc.root);

        let picture = xml::parse_fragment(&format!(
            concat!(
                r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="{name}"/>"#,
                r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
                r#"<p:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
                r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
            ),
            id = shape_id,
            name = xml::escape(name),
            rel = rel_id,
            x = PICTURE_LEFT,
            y = PICTURE_TOP,
            cx = cx,
            cy = cy,
        ))?;

        let tree = slide.doc.root.find_mut("p:spTree").ok_or_else(|| {
            OoxmlError::InvalidStructure(format!("{} has no p:spTree", slide.part))
        })?;
        tree.children.extend(picture);
        Ok(())
    }
}

/// One above the highest `p:cNvPr/@id` on the slide.
fn next_shape_id(root: &Element) -> u32 {
    let mut shapes = Vec::new();
    root.find_all("p:cNvPr", &mut shapes);
    shapes
        .iter()
        .filter_map(|e| e.attr("id").and_then(|id| id.parse::<u32>().ok()))
        .max()
        .unwrap_or(1)
        + 1
}
