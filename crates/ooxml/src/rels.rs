//! Part relationships (`_rels/*.rels`) and `[Content_Types].xml` bookkeeping.

use crate::package::Package;
use crate::xml::{Element, XmlDocument};
use crate::OoxmlResult;

pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub(crate) const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// The relationships of one source part.
#[derive(Debug, Clone)]
pub(crate) struct Relationships {
    doc: XmlDocument,
}

impl Relationships {
    /// Loads the relationships of `source_part`, or starts an empty set if it has none.
    pub fn load(package: &Package, source_part: &str) -> OoxmlResult<Self> {
        let path = rels_path_for(source_part);
        if package.contains(&path) {
            return Ok(Self {
                doc: package.xml(&path)?,
            });
        }

        let mut root = Element::new("Relationships");
        root.set_attr("xmlns", RELATIONSHIPS_NS);
        Ok(Self {
            doc: XmlDocument {
                prolog: Vec::new(),
                root,
                epilog: Vec::new(),
            },
        })
    }

    pub fn entries(&self) -> Vec<Relationship> {
        self.doc
            .root
            .child_elements()
            .filter(|e| e.name == "Relationship")
            .map(|e| Relationship {
                id: e.attr("Id").unwrap_or_default().to_string(),
                rel_type: e.attr("Type").unwrap_or_default().to_string(),
                target: e.attr("Target").unwrap_or_default().to_string(),
            })
            .collect()
    }

    pub fn target(&self, id: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find(|r| r.id == id)
            .map(|r| r.target)
    }

    /// Adds a relationship and returns its newly allocated `rIdN`.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .entries()
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{next}");

        let mut rel = Element::new("Relationship");
        rel.set_attr("Id", id.as_str());
        rel.set_attr("Type", rel_type);
        rel.set_attr("Target", target);
        self.doc.root.push(rel);
        id
    }

    pub fn save(&self, package: &mut Package, source_part: &str) -> OoxmlResult<()> {
        package.set_xml(&rels_path_for(source_part), &self.doc)
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`.
pub(crate) fn rels_path_for(source_part: &str) -> String {
    match source_part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{source_part}.rels"),
    }
}

/// Resolves a relationship target against the part that owns the relationship.
///
/// `("ppt/presentation.xml", "slides/slide1.xml")` -> `ppt/slides/slide1.xml`;
/// `("ppt/slides/slide1.xml", "../media/a.png")` -> `ppt/media/a.png`.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// The target to write in `source_part`'s relationships so it points at `target_part`.
pub(crate) fn relative_target(source_part: &str, target_part: &str) -> String {
    let mut from: Vec<&str> = source_part.split('/').collect();
    from.pop();
    let to: Vec<&str> = target_part.split('/').collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; from.len() - common];
    segments.extend(&to[common..]);
    segments.join("/")
}

/// Ensures a `<Default Extension=…>` entry exists for `extension`.
pub(crate) fn ensure_default_content_type(
    package: &mut Package,
    extension: &str,
    content_type: &str,
) -> OoxmlResult<()> {
    let mut doc = load_content_types(package)?;
    let exists = doc.root.child_elements().any(|e| {
        e.name == "Default"
            && e
                .attr("Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    });
    if !exists {
        let mut default = Element::new("Default");
        default.set_attr("Extension", extension);
        default.set_attr("ContentType", content_type);
        // Defaults conventionally precede overrides.
        let position = doc
            .root
            .children
            .iter()
            .position(|n| matches!(n, crate::xml::Node::Element(e) if e.name == "Override"))
            .unwrap_or(doc.root.children.len());
        doc.root
            .children
            .insert(position, crate::xml::Node::Element(default));
        package.set_xml(CONTENT_TYPES_PART, &doc)?;
    }
    Ok(())
}

/// Ensures an `<Override PartName=…>` entry exists for `part`.
pub(crate) fn ensure_override_content_type(
    package: &mut Package,
    part: &str,
    content_type: &str,
) -> OoxmlResult<()> {
    let part_name = format!("/{part}");
    let mut doc = load_content_types(package)?;
    let exists = doc
        .root
        .child_elements()
        .any(|e| e.name == "Override" && e.attr("PartName") == Some(part_name.as_str()));
    if !exists {
        let mut entry = Element::new("Override");
        entry.set_attr("PartName", part_name);
        entry.set_attr("ContentType", content_type);
        doc.root.push(entry);
        package.set_xml(CONTENT_TYPES_PART, &doc)?;
    }
    Ok(())
}

fn load_content_types(package: &Package) -> OoxmlResult<XmlDocument> {
    if package.contains(CONTENT_TYPES_PART) {
        return package.xml(CONTENT_TYPES_PART);
    }
    let mut root = Element::new("Types");
    root.set_attr("xmlns", CONTENT_TYPES_NS);
    Ok(XmlDocument {
        prolog: Vec::new(),
        root,
        epilog: Vec::new(),
    })
}
