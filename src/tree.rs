//! Description tree: a small hierarchical node structure holding persisted
//! metadata.
//!
//! Nodes are elements, attributes or text. An attribute node carries its
//! name in [`XmlNode::name`] and its value as a single text child, so path
//! lookups treat elements and attributes uniformly. Paths are dotted
//! (`NoDataValue.#le_hex_equiv`); a token starting with `#` addresses an
//! attribute. Name matching in lookups is ASCII case-insensitive.
//!
//! # Beispiel
//!
//! ```
//! use bandpam::tree::XmlNode;
//!
//! let mut root = XmlNode::element("PAMRasterBand");
//! root.set_value("#band", "1");
//! root.set_value("NoDataValue", "nan");
//! root.set_value("NoDataValue.#le_hex_equiv", "000000000000f87f");
//!
//! assert_eq!(root.value_at("nodatavalue"), Some("nan"));
//! assert_eq!(root.value_or("Offset", "0"), "0");
//! assert_eq!(root.value_at("#band"), Some("1"));
//! ```

mod parse;
mod write;

pub use parse::parse_xml;

/// Kind of a [`XmlNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
}

/// One node of a description tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    kind: NodeKind,
    value: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Creates an empty element.
    pub fn element(name: impl Into<String>) -> Self {
        Self { kind: NodeKind::Element, value: name.into(), children: Vec::new() }
    }

    /// Creates an attribute node holding `value`.
    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Attribute,
            value: name.into(),
            children: vec![Self::text(value)],
        }
    }

    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self { kind: NodeKind::Text, value: value.into(), children: Vec::new() }
    }

    /// Creates an element with a single text child.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::element(name);
        node.children.push(Self::text(text));
        node
    }

    pub fn kind(&self) -> NodeKind { self.kind }

    /// Element or attribute name; the content for text nodes.
    pub fn name(&self) -> &str { &self.value }

    pub fn children(&self) -> &[XmlNode] { &self.children }

    pub fn is_element(&self) -> bool { self.kind == NodeKind::Element }

    /// Returns `true` if the node has any child besides attributes.
    pub fn has_content(&self) -> bool {
        self.children.iter().any(|c| c.kind != NodeKind::Attribute)
    }

    /// Adds a child node.
    ///
    /// Attributes are placed after the existing attributes so they stay in
    /// front of element and text children; other nodes are appended.
    pub fn add_child(&mut self, child: XmlNode) {
        if child.kind == NodeKind::Attribute {
            let pos = self
                .children
                .iter()
                .position(|c| c.kind != NodeKind::Attribute)
                .unwrap_or(self.children.len());
            self.children.insert(pos, child);
        } else {
            self.children.push(child);
        }
    }

    /// Inserts a child at `index` (clamped to the child count).
    pub fn insert_child(&mut self, index: usize, child: XmlNode) {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
    }

    /// Removes and returns the child at `index`.
    pub fn remove_child(&mut self, index: usize) -> Option<XmlNode> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Iterates the element children named `name` (case-insensitive).
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children
            .iter()
            .filter(move |c| c.kind == NodeKind::Element && c.value.eq_ignore_ascii_case(name))
    }

    /// Value of the attribute `name` on this node.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.kind == NodeKind::Attribute && c.value.eq_ignore_ascii_case(name))
            .and_then(|a| a.children.first())
            .map(|t| t.value.as_str())
    }

    /// Finds the node at a dotted path below this node.
    pub fn node(&self, path: &str) -> Option<&XmlNode> {
        let mut current = self;
        for token in path.split('.') {
            current = current.children.iter().find(|c| token_matches(c, token))?;
        }
        Some(current)
    }

    fn node_mut(&mut self, path: &str) -> Option<&mut XmlNode> {
        let mut current = self;
        for token in path.split('.') {
            current = current.children.iter_mut().find(|c| token_matches(c, token))?;
        }
        Some(current)
    }

    /// Returns the value at a dotted path.
    ///
    /// For an attribute this is its value. For an element it is the text
    /// of its only non-attribute child; elements that are empty or have
    /// element children have no value.
    pub fn value_at(&self, path: &str) -> Option<&str> {
        let target = if path.is_empty() { self } else { self.node(path)? };
        target.own_value()
    }

    /// [`value_at`](Self::value_at) with a fallback.
    pub fn value_or<'a>(&'a self, path: &str, default: &'a str) -> &'a str {
        self.value_at(path).unwrap_or(default)
    }

    fn own_value(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Text => Some(&self.value),
            NodeKind::Attribute => self.children.first().map(|t| t.value.as_str()),
            NodeKind::Element => {
                let mut body = self.children.iter().filter(|c| c.kind != NodeKind::Attribute);
                match (body.next(), body.next()) {
                    (Some(only), None) if only.kind == NodeKind::Text => Some(&only.value),
                    _ => None,
                }
            }
        }
    }

    /// Sets the value at a dotted path, creating missing nodes.
    ///
    /// Tokens starting with `#` create attributes. An existing text child
    /// of the target is replaced, otherwise one is added.
    pub fn set_value(&mut self, path: &str, value: impl Into<String>) {
        let mut current = self;
        for token in path.split('.') {
            let pos = current.children.iter().position(|c| token_matches(c, token));
            let idx = match pos {
                Some(i) => i,
                None => {
                    let node = match token.strip_prefix('#') {
                        Some(attr) => Self {
                            kind: NodeKind::Attribute,
                            value: attr.to_string(),
                            children: Vec::new(),
                        },
                        None => Self::element(token),
                    };
                    current.add_child(node);
                    current
                        .children
                        .iter()
                        .position(|c| token_matches(c, token))
                        .unwrap_or(current.children.len() - 1)
                }
            };
            current = &mut current.children[idx];
        }
        let value = value.into();
        match current.children.iter_mut().find(|c| c.kind == NodeKind::Text) {
            Some(text) => text.value = value,
            None => current.children.push(Self::text(value)),
        }
    }

    /// Removes the first node at `path`; returns it if found.
    pub fn remove_at(&mut self, path: &str) -> Option<XmlNode> {
        let (parent, last) = match path.rsplit_once('.') {
            Some((head, last)) => (self.node_mut(head)?, last),
            None => (self, path),
        };
        let idx = parent.children.iter().position(|c| token_matches(c, last))?;
        parent.remove_child(idx)
    }
}

/// Prueft ob ein Pfad-Token (`Name` oder `#attr`) auf den Knoten passt.
fn token_matches(node: &XmlNode, token: &str) -> bool {
    match token.strip_prefix('#') {
        Some(attr) => node.kind == NodeKind::Attribute && node.value.eq_ignore_ascii_case(attr),
        None => node.kind == NodeKind::Element && node.value.eq_ignore_ascii_case(token),
    }
}
