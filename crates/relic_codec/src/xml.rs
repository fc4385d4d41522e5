//! A small XML tree, writer and reader.
//!
//! Persisted documents use a narrow slice of XML: elements, attributes,
//! character data and comments. The reader accepts a little more than the
//! writer produces (prologs, comments, either quote style, numeric character
//! references) so hand-edited documents keep loading.

use crate::error::MalformedInput;

// -----------------------------------------------------------------------------
// Element

/// One element of a document tree.
///
/// Character data and child elements are not mixed: an element with children
/// ignores any text between them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of the attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets (or replaces) an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.attributes.iter_mut().find(|(attr, _)| *attr == name) {
            Some(slot) => slot.1 = value.into(),
            None => self.attributes.push((name, value.into())),
        }
    }

    /// Returns the child elements in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Appends a child element.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Returns the character data.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the character data.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

// -----------------------------------------------------------------------------
// Writer

/// Renders a document with two-space indentation and no trailing newline.
pub fn render(root: &Element) -> String {
    let mut out = String::new();
    write_element(root, 0, &mut out);
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn write_element(element: &Element, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute_into(value, out);
        out.push('"');
    }
    if element.children.is_empty() && element.text.is_empty() {
        out.push_str("/>\n");
    } else if element.children.is_empty() {
        out.push('>');
        escape_text_into(&element.text, out);
        out.push_str("</");
        out.push_str(&element.name);
        out.push_str(">\n");
    } else {
        out.push_str(">\n");
        for child in &element.children {
            write_element(child, depth + 1, out);
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str("</");
        out.push_str(&element.name);
        out.push_str(">\n");
    }
}

fn escape_text_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

fn escape_attribute_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
}

// -----------------------------------------------------------------------------
// Reader

/// Parses a document into its root [`Element`].
pub fn parse(input: &str) -> Result<Element, MalformedInput> {
    let mut parser = Parser { input, pos: 0 };
    parser.skip_misc();
    let root = parser.parse_element()?;
    parser.skip_misc();
    if parser.pos < parser.input.len() {
        return Err(parser.fail("content after the document root"));
    }
    Ok(root)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn fail(&self, reason: impl Into<String>) -> MalformedInput {
        MalformedInput::Syntax {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    /// Skips whitespace, comments and processing instructions.
    fn skip_misc(&mut self) {
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("<?") {
                match self.rest().find("?>") {
                    Some(end) => self.pos += end + 2,
                    None => self.pos = self.input.len(),
                }
            } else if self.rest().starts_with("<!--") {
                match self.rest().find("-->") {
                    Some(end) => self.pos += end + 3,
                    None => self.pos = self.input.len(),
                }
            } else {
                return;
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element, MalformedInput> {
        if !self.rest().starts_with('<') {
            return Err(self.fail("expected an element open tag"));
        }
        self.pos += 1;
        let name = self.read_name()?;
        let mut element = Element::new(name);

        // Attributes, up to `>` or `/>`.
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("/>") {
                self.pos += 2;
                return Ok(element);
            }
            if self.rest().starts_with('>') {
                self.pos += 1;
                break;
            }
            let attr_name = self.read_name()?;
            self.skip_whitespace();
            if !self.rest().starts_with('=') {
                return Err(self.fail("expected `=` after an attribute name"));
            }
            self.pos += 1;
            self.skip_whitespace();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(self.fail("expected a quoted attribute value")),
            };
            self.pos += 1;
            let Some(end) = self.rest().find(quote) else {
                return Err(self.fail("unterminated attribute value"));
            };
            let raw = &self.input[self.pos..self.pos + end];
            let value = self.unescape(raw)?;
            self.pos += end + 1;
            element.set_attribute(attr_name, value);
        }

        // Content, up to the matching close tag.
        loop {
            if self.pos >= self.input.len() {
                return Err(self.fail(format!("unterminated element `{}`", element.name)));
            }
            if self.rest().starts_with("</") {
                self.pos += 2;
                let close = self.read_name()?;
                if close != element.name {
                    return Err(self.fail(format!(
                        "close tag `{close}` does not match open tag `{}`",
                        element.name
                    )));
                }
                self.skip_whitespace();
                if !self.rest().starts_with('>') {
                    return Err(self.fail("expected `>` after a close tag name"));
                }
                self.pos += 1;
                if !element.children.is_empty() {
                    element.text.clear();
                }
                return Ok(element);
            }
            if self.rest().starts_with("<!--") {
                let Some(end) = self.rest().find("-->") else {
                    return Err(self.fail("unterminated comment"));
                };
                self.pos += end + 3;
                continue;
            }
            if self.rest().starts_with('<') {
                let child = self.parse_element()?;
                element.children.push(child);
                continue;
            }
            let chunk = match self.rest().find('<') {
                Some(end) => &self.rest()[..end],
                None => self.rest(),
            };
            let text = self.unescape(chunk)?;
            element.text.push_str(&text);
            self.pos += chunk.len();
        }
    }

    fn read_name(&mut self) -> Result<String, MalformedInput> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '=' | '<'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.fail("expected a name"));
        }
        let name = rest[..end].to_owned();
        self.pos += end;
        Ok(name)
    }

    fn unescape(&self, raw: &str) -> Result<String, MalformedInput> {
        if !raw.contains('&') {
            return Ok(raw.to_owned());
        }
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            rest = &rest[amp + 1..];
            let Some(semi) = rest.find(';') else {
                return Err(self.fail("unterminated entity reference"));
            };
            let entity = &rest[..semi];
            let Some(decoded) = decode_entity(entity) else {
                return Err(self.fail(format!("unknown entity `&{entity};`")));
            };
            out.push(decoded);
            rest = &rest[semi + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn renders_nested_elements_with_indentation() {
        let mut point = Element::new("point");
        let mut x = Element::new("x");
        x.set_text("1");
        point.push_child(x);
        point.push_child(Element::new("label"));

        assert_eq!(render(&point), "<point>\n  <x>1</x>\n  <label/>\n</point>");
    }

    #[test]
    fn parses_what_it_renders() {
        let mut root = Element::new("job");
        root.set_attribute("class", "demo::Build");
        let mut note = Element::new("note");
        note.set_text("a < b & c");
        root.push_child(note);
        root.push_child(Element::new("empty"));

        let document = render(&root);
        assert_eq!(parse(&document).unwrap(), root);
    }

    #[test]
    fn accepts_prolog_comments_and_single_quotes() {
        let document = "<?xml version=\"1.0\"?>\n<!-- header -->\n\
                        <job kind='quick'>\n  <!-- inline -->\n  <id>7</id>\n</job>";
        let root = parse(document).unwrap();
        assert_eq!(root.name(), "job");
        assert_eq!(root.attribute("kind"), Some("quick"));
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].text(), "7");
    }

    #[test]
    fn decodes_character_references() {
        let root = parse("<t>&lt;tag&gt; &amp; &#65;&#x42;</t>").unwrap();
        assert_eq!(root.text(), "<tag> & AB");
    }

    #[test]
    fn rejects_malformed_documents() {
        for document in [
            "<a><b></a>",
            "<a",
            "<a></b>",
            "not xml",
            "<a/><b/>",
            "<a>&bogus;</a>",
        ] {
            let fault = parse(document).unwrap_err();
            assert!(matches!(fault, MalformedInput::Syntax { .. }), "{document}");
        }
    }

    #[test]
    fn whitespace_between_children_is_not_character_data() {
        let root = parse("<a>\n  <b/>\n</a>").unwrap();
        assert_eq!(root.text(), "");
        assert_eq!(root.children().len(), 1);
    }
}
