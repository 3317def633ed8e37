//! quick-xml adapter between WordprocessingML markup and [`Element`] trees.
//!
//! The engine never touches markup itself. This adapter is what a package
//! collaborator uses to turn `word/document.xml` (or the relationships part)
//! into a tree before a build and back into markup afterwards.
//!
//! Attribute order is preserved. Whitespace-only text is dropped everywhere
//! except inside text-bearing elements (`w:t`, `a:t`, ...), where it is
//! significant.
use super::{Element, Node};
use crate::common::xml::{escape_xml, resolve_entity, unescape_xml};
use crate::common::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// XML declaration Word writes at the top of every part.
pub const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Parse markup into its root element.
///
/// Declarations, comments and processing instructions are skipped.
///
/// # Examples
///
/// ```
/// use kumquat::tree::xml::parse_element;
///
/// let root = parse_element(r#"<w:t xml:space="preserve"> a &amp; b </w:t>"#).unwrap();
/// assert_eq!(root.name, "w:t");
/// assert_eq!(root.text(), Some(" a & b "));
/// ```
pub fn parse_element(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(start_element(&e)?);
            },
            Event::Empty(e) => {
                let element = start_element(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => return Ok(element),
                }
            },
            Event::End(_) => {
                let Some(mut element) = stack.pop() else {
                    return Err(Error::XmlError("Unbalanced end tag".to_string()));
                };
                if !preserves_whitespace(&element.name) {
                    element
                        .children
                        .retain(|c| !matches!(c, Node::Text(t) if t.trim().is_empty()));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => return Ok(element),
                }
            },
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    push_text(current, std::str::from_utf8(&e)?);
                }
            },
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    let inner = e.into_inner();
                    push_text(current, std::str::from_utf8(&inner)?);
                }
            },
            Event::GeneralRef(e) => {
                if let Some(current) = stack.last_mut() {
                    let name = std::str::from_utf8(&e)?;
                    match resolve_entity(name) {
                        Some(ch) => push_text(current, ch.encode_utf8(&mut [0u8; 4])),
                        None => push_text(current, &format!("&{};", name)),
                    }
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Err(Error::XmlError("No root element found".to_string()))
}

/// Serialize a part: the XML declaration followed by the root element.
pub fn write_document(root: &Element) -> String {
    let mut xml = String::with_capacity(XML_DECLARATION.len() + 2 + root.estimated_xml_len());
    xml.push_str(XML_DECLARATION);
    xml.push_str("\r\n");
    root.write_xml(&mut xml);
    xml
}

fn start_element(e: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(std::str::from_utf8(e.name().as_ref())?);
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = std::str::from_utf8(&attr.value)?;
        element.set_attr(key, unescape_xml(value));
    }
    Ok(element)
}

fn push_text(element: &mut Element, text: &str) {
    if let Some(Node::Text(last)) = element.children.last_mut() {
        last.push_str(text);
    } else {
        element.children.push(Node::Text(text.to_string()));
    }
}

fn preserves_whitespace(name: &str) -> bool {
    name == "t" || name.ends_with(":t") || name.ends_with(":instrText")
}

impl Element {
    /// Serialize this element and its subtree to markup.
    pub fn to_xml_string(&self) -> String {
        let mut xml = String::with_capacity(self.estimated_xml_len());
        self.write_xml(&mut xml);
        xml
    }

    fn estimated_xml_len(&self) -> usize {
        let mut len = 2 + self.name.len();
        for (key, value) in &self.attributes {
            len += key.len() + value.len() + 4;
        }
        for child in &self.children {
            len += match child {
                Node::Text(t) => t.len() + 8,
                Node::Element(e) => e.estimated_xml_len(),
            };
        }
        len + self.name.len() + 3
    }

    fn write_xml(&self, output: &mut String) {
        output.push('<');
        output.push_str(&self.name);

        for (key, value) in &self.attributes {
            output.push(' ');
            output.push_str(key);
            output.push_str("=\"");
            output.push_str(&escape_xml(value));
            output.push('"');
        }

        if self.children.is_empty() {
            output.push_str("/>");
            return;
        }

        output.push('>');
        for child in &self.children {
            match child {
                Node::Text(t) => output.push_str(&escape_xml(t)),
                Node::Element(e) => e.write_xml(output),
            }
        }
        output.push_str("</");
        output.push_str(&self.name);
        output.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::wml;

    #[test]
    fn test_parse_table_structure() {
        let xml = r#"<w:tbl>
            <w:tblPr><w:tblW w:w="5000" w:type="pct"/></w:tblPr>
            <w:tr>
                <w:tc>
                    <w:tcPr><w:shd w:val="clear" w:fill="auto"/></w:tcPr>
                    <w:p><w:r><w:t>{/image}</w:t></w:r></w:p>
                </w:tc>
            </w:tr>
        </w:tbl>"#;

        let table = parse_element(xml).unwrap();
        assert_eq!(table.name, wml::TABLE);
        assert_eq!(table.children.len(), 2);

        let row = table.find_first_child_by_name(wml::ROW).unwrap();
        let cell = row.find_first_child_by_name(wml::CELL).unwrap();
        let shd = cell
            .find_first_child_by_name(wml::CELL_PROPERTIES)
            .and_then(|p| p.find_first_child_by_name(wml::SHADING))
            .unwrap();
        let keys: Vec<&str> = shd.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["w:val", "w:fill"]);
        assert_eq!(cell.text_recursive(), "{/image}");
    }

    #[test]
    fn test_whitespace_preserved_in_text_only() {
        let xml = "<w:p>\n  <w:r>\n    <w:t xml:space=\"preserve\">  padded  </w:t>\n  </w:r>\n</w:p>";
        let p = parse_element(xml).unwrap();
        assert_eq!(p.children.len(), 1);
        let r = p.find_first_child_by_name(wml::RUN).unwrap();
        assert_eq!(r.children.len(), 1);
        assert_eq!(
            r.find_first_child_by_name(wml::TEXT).and_then(|t| t.text()),
            Some("  padded  ")
        );
    }

    #[test]
    fn test_entities_and_char_refs() {
        let p = parse_element("<w:t>R&amp;D &#x2013; &lt;draft&gt;</w:t>").unwrap();
        assert_eq!(p.text(), Some("R&D \u{2013} <draft>"));
        assert_eq!(p.children.len(), 1);
    }

    #[test]
    fn test_write_round_trip() {
        let xml = r#"<w:tc><w:tcPr><w:shd w:val="clear" w:fill="FF0000"/></w:tcPr><w:p><w:r><w:t>A &amp; B</w:t></w:r></w:p></w:tc>"#;
        let cell = parse_element(xml).unwrap();
        assert_eq!(cell.to_xml_string(), xml);
        assert_eq!(parse_element(&cell.to_xml_string()).unwrap(), cell);
    }

    #[test]
    fn test_write_document_declaration() {
        let out = write_document(&Element::new("w:document"));
        assert!(out.starts_with(XML_DECLARATION));
        assert!(out.ends_with("<w:document/>"));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_element(""), Err(Error::XmlError(_))));
        assert!(parse_element("<a><b></a>").is_err());
    }
}
