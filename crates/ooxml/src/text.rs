//! Literal placeholder replacement over paragraph text.
//!
//! A paragraph's visible text is usually split over several runs (spell-check marks, edits,
//! formatting changes), so a token like `{{ name }}` may straddle runs. Replacement works on the
//! paragraph's concatenated text; when anything changes, the new text is written into the first
//! text element and the paragraph's other text elements are emptied.

use crate::xml::{Element, Node};

/// The markup dialect of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    /// WordprocessingML (`w:p` / `w:r` / `w:t`).
    Word,
    /// DrawingML text bodies used by slides (`a:p` / `a:r` / `a:t`).
    Drawing,
}

impl Dialect {
    pub fn paragraph(&self) -> &'static str {
        match self {
            Dialect::Word => "w:p",
            Dialect::Drawing => "a:p",
        }
    }

    fn run(&self) -> &'static str {
        match self {
            Dialect::Word => "w:r",
            Dialect::Drawing => "a:r",
        }
    }

    fn text(&self) -> &'static str {
        match self {
            Dialect::Word => "w:t",
            Dialect::Drawing => "a:t",
        }
    }

    fn line_break(&self) -> &'static str {
        match self {
            Dialect::Word => "w:br",
            Dialect::Drawing => "a:br",
        }
    }

    /// Text-wrapping breaks only; Word page and column breaks are layout, not text.
    fn is_line_break(&self, el: &Element) -> bool {
        el.name == self.line_break()
            && match self {
                Dialect::Word => el.attr("w:type").map_or(true, |t| t == "textWrapping"),
                Dialect::Drawing => true,
            }
    }
}

/// Replaces every token in every paragraph below `root`. Returns the number of occurrences
/// replaced.
///
/// Tokens are applied in slice order; each occurrence is replaced exactly once per call.
pub(crate) fn replace_placeholders(
    root: &mut Element,
    dialect: Dialect,
    replacements: &[(String, String)],
) -> usize {
    let mut count = 0;
    if root.name == dialect.paragraph() {
        count += replace_in_paragraph(root, dialect, replacements);
    }
    for child in root.children.iter_mut() {
        if let Node::Element(child) = child {
            count += replace_placeholders(child, dialect, replacements);
        }
    }
    count
}

/// Text of each paragraph below `root`, in document order. Nested paragraphs (text boxes)
/// appear separately and are not included in their parent's text.
pub(crate) fn paragraph_texts(root: &Element, dialect: Dialect) -> Vec<String> {
    let mut out = Vec::new();
    collect_paragraph_texts(root, dialect, &mut out);
    out
}

fn collect_paragraph_texts(el: &Element, dialect: Dialect, out: &mut Vec<String>) {
    if el.name == dialect.paragraph() {
        out.push(own_text(el, dialect));
    }
    for child in el.child_elements() {
        collect_paragraph_texts(child, dialect, out);
    }
}

fn replace_in_paragraph(
    paragraph: &mut Element,
    dialect: Dialect,
    replacements: &[(String, String)],
) -> usize {
    let original = own_text(paragraph, dialect);
    if original.is_empty() {
        return 0;
    }

    let mut text = original;
    let mut count = 0;
    for (token, value) in replacements {
        if token.is_empty() {
            continue;
        }
        let hits = text.matches(token.as_str()).count();
        if hits > 0 {
            text = text.replace(token.as_str(), value);
            count += hits;
        }
    }
    if count == 0 {
        return 0;
    }

    strip_line_breaks(paragraph, dialect);
    let mut remaining = Some(text);
    for_each_own_text(paragraph, dialect, &mut |t| {
        let content = remaining.take().unwrap_or_default();
        if dialect == Dialect::Word && content.trim() != content {
            t.set_attr("xml:space", "preserve");
        }
        t.set_text(content);
    });

    split_line_breaks(paragraph, dialect);
    count
}

fn own_text(el: &Element, dialect: Dialect) -> String {
    let mut out = String::new();
    fn walk(el: &Element, dialect: Dialect, out: &mut String) {
        for child in el.child_elements() {
            if child.name == dialect.text() {
                out.push_str(&child.text());
            } else if dialect.is_line_break(child) {
                out.push('\n');
            } else if child.name != dialect.paragraph() {
                walk(child, dialect, out);
            }
        }
    }
    walk(el, dialect, &mut out);
    out
}

fn for_each_own_text(el: &mut Element, dialect: Dialect, f: &mut dyn FnMut(&mut Element)) {
    for child in el.children.iter_mut() {
        if let Node::Element(child) = child {
            if child.name == dialect.text() {
                f(child);
            } else if child.name != dialect.paragraph() {
                for_each_own_text(child, dialect, f);
            }
        }
    }
}

/// Removes the paragraph's own line breaks; they are already part of its text as `\n`.
fn strip_line_breaks(el: &mut Element, dialect: Dialect) {
    el.children
        .retain(|n| !matches!(n, Node::Element(e) if dialect.is_line_break(e)));
    for child in el.children.iter_mut() {
        if let Node::Element(child) = child {
            if child.name != dialect.paragraph() {
                strip_line_breaks(child, dialect);
            }
        }
    }
}

/// Turns `\n` in rewritten text into real line breaks.
///
/// Word breaks live inside a run (`<w:t/><w:br/><w:t/>`); DrawingML breaks sit between runs
/// (`<a:r/><a:br/><a:r/>`).
fn split_line_breaks(el: &mut Element, dialect: Dialect) {
    let container = match dialect {
        Dialect::Word => dialect.run(),
        Dialect::Drawing => dialect.paragraph(),
    };
    let splittable = match dialect {
        Dialect::Word => dialect.text(),
        Dialect::Drawing => dialect.run(),
    };

    if el.name == container {
        let mut out = Vec::with_capacity(el.children.len());
        for node in std::mem::take(&mut el.children) {
            match node {
                Node::Element(child) if child.name == splittable && child.text().contains('\n') => {
                    let text = child.text();
                    for (i, line) in text.split('\n').enumerate() {
                        if i > 0 {
                            out.push(Node::Element(Element::new(dialect.line_break())));
                        }
                        out.push(Node::Element(with_text(&child, line, dialect)));
                    }
                }
                other => out.push(other),
            }
        }
        el.children = out;
    }

    for child in el.children.iter_mut() {
        if let Node::Element(child) = child {
            if child.name != dialect.paragraph() {
                split_line_breaks(child, dialect);
            }
        }
    }
}

/// Copy of a text element (Word) or run (DrawingML) carrying `line` as its only text.
fn with_text(template: &Element, line: &str, dialect: Dialect) -> Element {
    let mut copy = template.clone();
    match dialect {
        Dialect::Word => {
            copy.set_text(line);
            if line.trim() != line {
                copy.set_attr("xml:space", "preserve");
            }
        }
        Dialect::Drawing => {
            if let Some(t) = copy.child_mut(dialect.text()) {
                t.set_text(line);
            }
        }
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;

    fn reps(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn word(body: &str) -> Element {
        XmlDocument::parse("test", format!("<w:body>{body}</w:body>").as_bytes())
            .unwrap()
            .root
    }

    #[test]
    fn test_replaces_token_in_single_run() {
        let mut root = word("<w:p><w:r><w:t>Hello {{ name }}!</w:t></w:r></w:p>");
        let n = replace_placeholders(&mut root, Dialect::Word, &reps(&[("{{ name }}", "Ada")]));
        assert_eq!(n, 1);
        assert_eq!(paragraph_texts(&root, Dialect::Word), vec!["Hello Ada!"]);
    }

    #[test]
    fn test_replaces_token_split_across_runs() {
        let mut root = word(
            "<w:p><w:r><w:t>{{ na</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>me }}</w:t></w:r></w:p>",
        );
        replace_placeholders(&mut root, Dialect::Word, &reps(&[("{{ name }}", "Ada")]));
        assert_eq!(paragraph_texts(&root, Dialect::Word), vec!["Ada"]);
        let mut texts = Vec::new();
        root.find_all("w:t", &mut texts);
        assert_eq!(texts[0].text(), "Ada");
        assert_eq!(texts[1].text(), "");
    }

    #[test]
    fn test_untouched_paragraph_is_not_rewritten() {
        let source = "<w:p><w:r><w:t>plain</w:t></w:r><w:r><w:t> text</w:t></w:r></w:p>";
        let mut root = word(source);
        let before = root.clone();
        let n = replace_placeholders(&mut root, Dialect::Word, &reps(&[("{{ x }}", "y")]));
        assert_eq!(n, 0);
        assert_eq!(root, before);
    }

    #[test]
    fn test_counts_every_occurrence() {
        let mut root = word("<w:p><w:r><w:t>{{ a }} and {{ a }}</w:t></w:r></w:p>");
        let n = replace_placeholders(&mut root, Dialect::Word, &reps(&[("{{ a }}", "1")]));
        assert_eq!(n, 2);
        assert_eq!(paragraph_texts(&root, Dialect::Word), vec!["1 and 1"]);
    }

    #[test]
    fn test_table_cells_are_paragraphs_too() {
        let mut root = word(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{ cell }}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        );
        replace_placeholders(&mut root, Dialect::Word, &reps(&[("{{ cell }}", "filled")]));
        assert_eq!(paragraph_texts(&root, Dialect::Word), vec!["filled"]);
    }

    #[test]
    fn test_newlines_become_word_breaks() {
        let mut root = word("<w:p><w:r><w:t>{{ toc }}</w:t></w:r></w:p>");
        replace_placeholders(&mut root, Dialect::Word, &reps(&[("{{ toc }}", "1. A\n2. B")]));
        let mut breaks = Vec::new();
        root.find_all("w:br", &mut breaks);
        assert_eq!(breaks.len(), 1);
        assert_eq!(paragraph_texts(&root, Dialect::Word), vec!["1. A\n2. B"]);
    }

    #[test]
    fn test_newlines_become_drawing_breaks_between_runs() {
        let mut root = XmlDocument::parse(
            "test",
            b"<p:txBody><a:p><a:r><a:rPr lang=\"en-GB\"/><a:t>{{ x }}</a:t></a:r></a:p></p:txBody>",
        )
        .unwrap()
        .root;
        replace_placeholders(&mut root, Dialect::Drawing, &reps(&[("{{ x }}", "one\ntwo")]));

        let paragraph = root.child("a:p").unwrap();
        let names: Vec<&str> = paragraph
            .child_elements()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["a:r", "a:br", "a:r"]);
        assert_eq!(paragraph_texts(&root, Dialect::Drawing), vec!["one\ntwo"]);
    }

    #[test]
    fn test_preserve_space_set_for_padded_word_text() {
        let mut root = word("<w:p><w:r><w:t>{{ x }}</w:t></w:r></w:p>");
        replace_placeholders(&mut root, Dialect::Word, &reps(&[("{{ x }}", " padded ")]));
        let t = root.find("w:t").unwrap();
        assert_eq!(t.attr("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let mut root = word("<w:p><w:r><w:t>{{ a }}</w:t></w:r></w:p>");
        let r = reps(&[("{{ a }}", "value")]);
        replace_placeholders(&mut root, Dialect::Word, &r);
        let once = root.clone();
        let n = replace_placeholders(&mut root, Dialect::Word, &r);
        assert_eq!(n, 0);
        assert_eq!(root, once);
    }
}
