use crate::error::Error;
use crate::Result;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::XmlNode;

/// Parses description text into a tree.
///
/// Entities are unescaped, CDATA is kept as text, and raw text consisting
/// only of whitespace is dropped. Whitespace written as character references
/// is kept. The XML declaration, comments, processing
/// instructions and DOCTYPE are skipped.
///
/// ```
/// use bandpam::tree::parse_xml;
///
/// let root = parse_xml("<PAMRasterBand band=\"1\"><Offset>2.5</Offset></PAMRasterBand>").unwrap();
/// assert_eq!(root.name(), "PAMRasterBand");
/// assert_eq!(root.value_at("Offset"), Some("2.5"));
/// ```
pub fn parse_xml(text: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    // Offene Elemente; das letzte ist das aktuelle Elternelement.
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;
    // Gepufferter Text bis zum naechsten Struktur-Event.
    let mut pending = PendingText::default();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                pending.flush_into(stack.last_mut());
                let node = start_node(&e)?;
                check_single_root(&root, &stack)?;
                stack.push(node);
            }
            Ok(Event::Empty(e)) => {
                pending.flush_into(stack.last_mut());
                let node = start_node(&e)?;
                check_single_root(&root, &stack)?;
                close_node(node, &mut stack, &mut root);
            }
            Ok(Event::End(_e)) => {
                pending.flush_into(stack.last_mut());
                let node = stack.pop().ok_or_else(|| {
                    Error::XmlParseError("unerwartetes End-Element bei depth=0".to_string())
                })?;
                close_node(node, &mut stack, &mut root);
            }
            Ok(Event::Text(e)) => {
                let raw = utf8(&e)?;
                let text = quick_xml::escape::unescape(raw)
                    .map_err(|er| Error::XmlParseError(er.to_string()))?;
                if stack.is_empty() {
                    if !text.trim().is_empty() {
                        return Err(Error::XmlParseError(
                            "character data outside root element".to_string(),
                        ));
                    }
                } else {
                    pending.push(&normalize_line_endings(&text), false);
                }
            }
            Ok(Event::CData(e)) => {
                let bytes = e.into_inner();
                let text = utf8(&bytes)?;
                if !stack.is_empty() {
                    pending.push(&normalize_line_endings(text), true);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                let name = utf8(&e)?;
                let resolved = if let Some(code) = name.strip_prefix('#') {
                    resolve_char_reference(code).map(String::from)
                } else {
                    resolve_predefined_entity(name).map(str::to_string)
                };
                match resolved {
                    Some(value) if !stack.is_empty() => pending.push(&value, true),
                    Some(_) => {}
                    None => {
                        return Err(Error::XmlParseError(format!("unknown entity '&{name};'")));
                    }
                }
            }
            Ok(Event::Comment(_) | Event::PI(_) | Event::DocType(_) | Event::Decl(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlParseError(format!(
                    "parse XML error at {:?}: {e}",
                    reader.buffer_position()
                )));
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(Error::XmlParseError(format!("unclosed element <{}>", open.name())));
    }
    root.ok_or_else(|| Error::XmlParseError("no root element".to_string()))
}

/// Sammelt Text zwischen zwei Struktur-Events.
#[derive(Default)]
struct PendingText {
    text: String,
    // CDATA und Entities machen den Text signifikant, auch wenn er nur
    // aus Whitespace besteht.
    significant: bool,
}

impl PendingText {
    fn push(&mut self, text: &str, significant: bool) {
        self.text.push_str(text);
        self.significant |= significant;
    }

    fn flush_into(&mut self, parent: Option<&mut XmlNode>) {
        let text = std::mem::take(&mut self.text);
        let significant = std::mem::replace(&mut self.significant, false);
        if let Some(parent) = parent
            && (significant || !text.trim().is_empty())
        {
            parent.add_child(XmlNode::text(text));
        }
    }
}

/// Erzeugt einen Element-Knoten inklusive Attribute.
fn start_node(e: &BytesStart<'_>) -> Result<XmlNode> {
    let mut node = XmlNode::element(utf8(e.name().as_ref())?);
    for attr in e.attributes() {
        let attr = attr.map_err(|er| Error::XmlParseError(er.to_string()))?;
        let key = utf8(attr.key.as_ref())?;
        let raw = utf8(&attr.value)?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|er| Error::XmlParseError(er.to_string()))?;
        node.add_child(XmlNode::attribute(key, value.into_owned()));
    }
    Ok(node)
}

/// Haengt ein fertiges Element an sein Elternelement oder setzt die Wurzel.
fn close_node(node: XmlNode, stack: &mut [XmlNode], root: &mut Option<XmlNode>) {
    match stack.last_mut() {
        Some(parent) => parent.add_child(node),
        None => *root = Some(node),
    }
}

fn check_single_root(root: &Option<XmlNode>, stack: &[XmlNode]) -> Result<()> {
    if root.is_some() && stack.is_empty() {
        return Err(Error::XmlParseError("multiple root elements".to_string()));
    }
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|er| Error::XmlParseError(er.to_string()))
}

/// XML 1.0 Sec. 2.11: \r\n -> \n, alleinstehende \r -> \n. Gilt nur fuer
/// Rohtext; `&#13;` bleibt erhalten.
fn normalize_line_endings(s: &str) -> String {
    if memchr::memchr(b'\r', s.as_bytes()).is_none() {
        return s.to_string();
    }
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Loest eine Zeichenreferenz auf (`49` dezimal oder `x31` hexadezimal).
fn resolve_char_reference(code: &str) -> Option<char> {
    let code_point = if let Some(hex) = code.strip_prefix('x') {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        code.parse::<u32>().ok()?
    };
    char::from_u32(code_point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeKind;

    #[test]
    fn parses_nested_elements_and_attributes() {
        let xml = r#"<?xml version="1.0"?>
<PAMRasterBand band="2">
  <NoDataValue le_hex_equiv="9a9999999999b93f">1.00000000000000E-01</NoDataValue>
  <CategoryNames>
    <Category>water</Category>
    <Category />
  </CategoryNames>
</PAMRasterBand>"#;
        let root = parse_xml(xml).unwrap();
        assert_eq!(root.attribute_value("band"), Some("2"));
        assert_eq!(root.value_at("NoDataValue"), Some("1.00000000000000E-01"));
        assert_eq!(root.value_at("NoDataValue.#le_hex_equiv"), Some("9a9999999999b93f"));
        let cats: Vec<_> = root.node("CategoryNames").unwrap().elements_named("Category").collect();
        assert_eq!(cats.len(), 2);
        assert!(cats[1].children().is_empty());
    }

    #[test]
    fn unescapes_text_and_attributes() {
        let root = parse_xml(r#"<R a="x &amp; &quot;y&quot;">1 &lt; 2 &#65;</R>"#).unwrap();
        assert_eq!(root.attribute_value("a"), Some("x & \"y\""));
        assert_eq!(root.value_at(""), Some("1 < 2 A"));
        let texts: Vec<_> = root
            .children()
            .iter()
            .filter(|c| c.kind() == NodeKind::Text)
            .collect();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].name(), "1 < 2 A");
    }

    #[test]
    fn cdata_kept_as_text() {
        let root = parse_xml("<R><![CDATA[a<b]]></R>").unwrap();
        assert_eq!(root.value_at(""), Some("a<b"));
    }

    #[test]
    fn whitespace_only_text_dropped() {
        let root = parse_xml("<R>\n  <A>1</A>\n</R>").unwrap();
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn char_ref_whitespace_is_significant() {
        let root = parse_xml("<R><A>&#32;&#32;</A><B>x\r\ny&#13;</B></R>").unwrap();
        assert_eq!(root.value_at("A"), Some("  "));
        assert_eq!(root.value_at("B"), Some("x\ny\r"));
    }

    #[test]
    fn comments_and_pis_skipped() {
        let root = parse_xml("<!-- c --><R><?pi x?><A>1</A><!-- d --></R>").unwrap();
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.value_at("A"), Some("1"));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_xml("").is_err());
        assert!(parse_xml("<R>").is_err());
        assert!(parse_xml("<R></S>").is_err());
        assert!(parse_xml("<R/><S/>").is_err());
        assert!(parse_xml("text<R/>").is_err());
    }
}
