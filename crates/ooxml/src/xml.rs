//! A small owned XML tree on top of `quick-xml`.
//!
//! Office parts are edited structurally (paragraphs rewritten, pictures appended), which is
//! awkward on a pure event stream. The tree keeps everything it does not understand
//! (declarations, comments, processing instructions, CDATA) as raw events so a parse/write
//! cycle preserves the part's content.

use crate::{OoxmlError, OoxmlResult};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in an [`XmlDocument`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Anything else, written back verbatim.
    Other(Event<'static>),
}

/// An element with its qualified name, attributes in source order, and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the value of attribute `key` (qualified name), if present.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets attribute `key`, replacing an existing value.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Iterates over the direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Returns the first direct child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Depth-first search (pre-order, self included) for the first element called `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(e) => e.find_mut(name),
            _ => None,
        })
    }

    /// Collects every descendant element (self included) called `name`, in document order.
    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        if self.name == name {
            out.push(self);
        }
        for child in self.child_elements() {
            child.find_all(name, out);
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                Node::Other(_) => {}
            }
        }
    }

    /// Replaces all children with a single text node (or nothing for an empty string).
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text));
        }
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }
}

/// A parsed XML part: prolog nodes, the root element, and anything trailing it.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
}

impl XmlDocument {
    /// Parses a complete XML document.
    ///
    /// `part` is only used to label errors.
    ///
    /// # Errors
    ///
    /// Returns `OoxmlError::Xml` if the bytes are not well-formed or contain no root element.
    pub fn parse(part: &str, bytes: &[u8]) -> OoxmlResult<Self> {
        let nodes = parse_nodes(part, bytes)?;

        let mut prolog = Vec::new();
        let mut root = None;
        let mut epilog = Vec::new();
        for node in nodes {
            match node {
                Node::Element(e) if root.is_none() => root = Some(e),
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        let root = root.ok_or_else(|| OoxmlError::Xml {
            part: part.to_string(),
            message: "document has no root element".into(),
        })?;

        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// Serialises the document back to bytes.
    pub fn to_bytes(&self) -> OoxmlResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

/// Parses a sequence of sibling nodes, e.g. a snippet of elements to splice into a tree.
///
/// Namespace prefixes are not resolved, so a fragment may use prefixes declared only on the
/// document it is inserted into.
pub fn parse_fragment(fragment: &str) -> OoxmlResult<Vec<Node>> {
    parse_nodes("<fragment>", fragment.as_bytes())
}

/// Escapes text for use inside attribute values or element content of a fragment.
pub fn escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> OoxmlError {
    OoxmlError::Xml {
        part: part.to_string(),
        message: err.to_string(),
    }
}

fn parse_nodes(part: &str, bytes: &[u8]) -> OoxmlResult<Vec<Node>> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut top: Vec<Node> = Vec::new();

    fn push(stack: &mut [Element], top: &mut Vec<Node>, node: Node) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => top.push(node),
        }
    }

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(part, e))?;
        match event {
            Event::Start(start) => stack.push(element_from_start(part, &start)?),
            Event::Empty(start) => {
                let element = element_from_start(part, &start)?;
                push(&mut stack, &mut top, Node::Element(element));
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error(part, "unbalanced end tag"))?;
                push(&mut stack, &mut top, Node::Element(element));
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| xml_error(part, e))?;
                push(&mut stack, &mut top, Node::Text(text.into_owned()));
            }
            Event::Eof => break,
            other => push(&mut stack, &mut top, Node::Other(other.into_owned())),
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(xml_error(part, format!("unclosed element <{}>", open.name)));
    }

    Ok(top)
}

fn element_from_start(part: &str, start: &BytesStart<'_>) -> OoxmlResult<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(part, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| xml_error(part, e))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> OoxmlResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| xml_error(&element.name, e));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| xml_error(&element.name, e))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| xml_error(&element.name, e))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> OoxmlResult<()> {
    match node {
        Node::Element(element) => write_element(writer, element),
        Node::Text(text) => writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| xml_error("<text>", e)),
        Node::Other(event) => writer
            .write_event(event.clone())
            .map_err(|e| xml_error("<event>", e)),
    }
}
