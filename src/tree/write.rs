use std::io::Write;

use crate::error::Error;
use crate::Result;

use super::{NodeKind, XmlNode};

// ============================================================================
// Pretty-Printer fuer Beschreibungsbaeume
// ============================================================================

impl XmlNode {
    /// Serializes the tree as indented text (two spaces per level).
    ///
    /// ```
    /// use bandpam::tree::XmlNode;
    ///
    /// let mut root = XmlNode::element("PAMRasterBand");
    /// root.set_value("#band", "1");
    /// root.set_value("Offset", "2.5");
    /// assert_eq!(
    ///     root.to_xml_string().unwrap(),
    ///     "<PAMRasterBand band=\"1\">\n  <Offset>2.5</Offset>\n</PAMRasterBand>\n"
    /// );
    /// ```
    pub fn to_xml_string(&self) -> Result<String> {
        self.to_xml_string_with_indent(2)
    }

    /// Serializes the tree with `indent` spaces per nesting level.
    pub fn to_xml_string_with_indent(&self, indent: usize) -> Result<String> {
        let mut out = Vec::new();
        self.write_xml(&mut out, indent)?;
        String::from_utf8(out).map_err(|e| Error::IoError(e.to_string()))
    }

    /// Writes the tree to `writer`.
    ///
    /// Elements whose only content is one text node are written on a single
    /// line; elements without content are written as `<Name />`.
    pub fn write_xml(&self, mut writer: impl Write, indent: usize) -> Result<()> {
        write_node(&mut writer, self, 0, indent)?;
        writer.flush().map_err(io_err)
    }
}

fn write_node(writer: &mut impl Write, node: &XmlNode, depth: usize, indent: usize) -> Result<()> {
    write_indent(writer, depth * indent)?;
    match node.kind {
        NodeKind::Text => {
            write_escaped_text(writer, &node.value)?;
            return w(writer, "\n");
        }
        // Attribute werden vom Elternelement geschrieben; ein alleinstehendes
        // Attribut wird als name="wert" ausgegeben.
        NodeKind::Attribute => {
            write_attribute(writer, node)?;
            return w(writer, "\n");
        }
        NodeKind::Element => {}
    }

    w(writer, "<")?;
    w(writer, &node.value)?;
    for attr in node.children.iter().filter(|c| c.kind == NodeKind::Attribute) {
        w(writer, " ")?;
        write_attribute(writer, attr)?;
    }

    let body: Vec<&XmlNode> = node
        .children
        .iter()
        .filter(|c| c.kind != NodeKind::Attribute)
        .collect();
    match body.as_slice() {
        [] => w(writer, " />\n"),
        [only] if only.kind == NodeKind::Text => {
            w(writer, ">")?;
            write_escaped_text(writer, &only.value)?;
            w(writer, "</")?;
            w(writer, &node.value)?;
            w(writer, ">\n")
        }
        children => {
            w(writer, ">\n")?;
            for child in children {
                write_node(writer, child, depth + 1, indent)?;
            }
            write_indent(writer, depth * indent)?;
            w(writer, "</")?;
            w(writer, &node.value)?;
            w(writer, ">\n")
        }
    }
}

fn write_attribute(writer: &mut impl Write, attr: &XmlNode) -> Result<()> {
    w(writer, &attr.value)?;
    w(writer, "=\"")?;
    if let Some(text) = attr.children.first() {
        write_escaped_attr(writer, &text.value)?;
    }
    w(writer, "\"")
}

fn write_indent(writer: &mut impl Write, width: usize) -> Result<()> {
    // Statischer Spaces-Buffer; tiefere Verschachtelungen in Stuecken.
    const SPACES: &[u8; 128] = &[b' '; 128];
    let mut remaining = width;
    while remaining > 0 {
        let chunk = remaining.min(SPACES.len());
        writer.write_all(&SPACES[..chunk]).map_err(io_err)?;
        remaining -= chunk;
    }
    Ok(())
}

/// io::Error → Error Konvertierung.
fn io_err(e: std::io::Error) -> Error {
    Error::IoError(e.to_string())
}

/// Schreibt einen String als Bytes in den Writer.
#[inline]
fn w(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(s.as_bytes()).map_err(io_err)
}

/// XML-Escaping mit memchr3: Sucht drei Zeichen gleichzeitig und ersetzt sie.
fn write_escaped_memchr3(
    w: &mut impl Write,
    s: &str,
    needle: [u8; 3],
    replacement: [&[u8]; 3],
) -> Result<()> {
    let bytes = s.as_bytes();
    let mut start = 0;
    while let Some(offset) = memchr::memchr3(needle[0], needle[1], needle[2], &bytes[start..]) {
        let pos = start + offset;
        w.write_all(&bytes[start..pos]).map_err(io_err)?;
        let idx = if bytes[pos] == needle[0] {
            0
        } else if bytes[pos] == needle[1] {
            1
        } else {
            2
        };
        w.write_all(replacement[idx]).map_err(io_err)?;
        start = pos + 1;
    }
    w.write_all(&bytes[start..]).map_err(io_err)
}

/// XML-Escaping fuer Text-Inhalt: & < > → &amp; &lt; &gt;, \r → &#13;
///
/// Reiner Whitespace wird komplett als Zeichenreferenzen geschrieben, sonst
/// verwirft ihn der Parser als Einrueckung.
fn write_escaped_text(w: &mut impl Write, s: &str) -> Result<()> {
    if !s.is_empty() && s.trim().is_empty() {
        for c in s.chars() {
            write!(w, "&#{};", u32::from(c)).map_err(io_err)?;
        }
        return Ok(());
    }
    let mut pieces = s.split('\r');
    if let Some(first) = pieces.next() {
        write_escaped_memchr3(w, first, [b'&', b'<', b'>'], [b"&amp;", b"&lt;", b"&gt;"])?;
    }
    for piece in pieces {
        w.write_all(b"&#13;").map_err(io_err)?;
        write_escaped_memchr3(w, piece, [b'&', b'<', b'>'], [b"&amp;", b"&lt;", b"&gt;"])?;
    }
    Ok(())
}

/// XML-Escaping fuer Attribut-Werte: & < " → &amp; &lt; &quot;
fn write_escaped_attr(w: &mut impl Write, s: &str) -> Result<()> {
    write_escaped_memchr3(w, s, [b'&', b'<', b'"'], [b"&amp;", b"&lt;", b"&quot;"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_xml;

    #[test]
    fn empty_element_self_closes() {
        let mut root = XmlNode::element("ColorTable");
        let mut entry = XmlNode::element("Entry");
        entry.add_child(XmlNode::attribute("c1", "0"));
        entry.add_child(XmlNode::attribute("c4", "255"));
        root.add_child(entry);
        assert_eq!(
            root.to_xml_string().unwrap(),
            "<ColorTable>\n  <Entry c1=\"0\" c4=\"255\" />\n</ColorTable>\n"
        );
    }

    #[test]
    fn escapes_text_and_attributes() {
        let mut root = XmlNode::element("R");
        root.add_child(XmlNode::attribute("a", "\"<&"));
        root.add_child(XmlNode::leaf("T", "a<b>&c"));
        let text = root.to_xml_string().unwrap();
        assert!(text.contains("a=\"&quot;&lt;&amp;\""), "{text}");
        assert!(text.contains("<T>a&lt;b&gt;&amp;c</T>"), "{text}");
    }

    #[test]
    fn mixed_content_indented() {
        let mut root = XmlNode::element("R");
        root.add_child(XmlNode::text("t"));
        root.add_child(XmlNode::leaf("A", "1"));
        assert_eq!(root.to_xml_string().unwrap(), "<R>\n  t\n  <A>1</A>\n</R>\n");
    }

    #[test]
    fn custom_indent() {
        let mut root = XmlNode::element("R");
        root.set_value("A.B", "1");
        assert_eq!(
            root.to_xml_string_with_indent(4).unwrap(),
            "<R>\n    <A>\n        <B>1</B>\n    </A>\n</R>\n"
        );
    }

    #[test]
    fn whitespace_only_text_written_as_char_refs() {
        let mut root = XmlNode::element("R");
        root.add_child(XmlNode::leaf("D", " \t"));
        root.add_child(XmlNode::leaf("E", "a\r\nb"));
        let text = root.to_xml_string().unwrap();
        assert!(text.contains("<D>&#32;&#9;</D>"), "{text}");
        assert!(text.contains("<E>a&#13;\nb</E>"), "{text}");

        let back = parse_xml(&text).unwrap();
        assert_eq!(back.value_at("D"), Some(" \t"));
        assert_eq!(back.value_at("E"), Some("a\r\nb"));
    }

    #[test]
    fn reparse_is_identical() {
        let mut root = XmlNode::element("PAMRasterBand");
        root.set_value("#band", "1");
        root.set_value("Description", "a & b");
        root.set_value("Histograms.HistItem.HistCounts", "1|2|3");
        let text = root.to_xml_string().unwrap();
        assert_eq!(parse_xml(&text).unwrap(), root);
    }
}
