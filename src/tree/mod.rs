//! Generic document tree.
//!
//! Every fragment the engine reads or writes is a [`Node`]: either an
//! [`Element`] with a qualified name, ordered attributes and ordered children,
//! or a text leaf. The tree is produced and consumed by the package
//! collaborators (see [`xml`] for the bundled quick-xml adapter); the engine
//! only rearranges and rewrites it.
//!
//! Traversal goes through explicit search helpers such as
//! [`Element::find_first_child_by_name`] and
//! [`Element::find_all_children_by_name`] rather than ad-hoc filtering.

pub mod wml;
#[cfg(feature = "xml")]
pub mod xml;

#[cfg(test)]
pub(crate) mod fixtures;

use smallvec::SmallVec;

/// Ordered attribute list of an element. Keys are unique.
pub type Attributes = SmallVec<[(String, String); 4]>;

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element such as `w:tbl` or `w:t`
    Element(Element),
    /// A text leaf. Text leaves never have children.
    Text(String),
}

impl Node {
    /// Create a text leaf.
    #[inline]
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Get the element, if this node is one.
    #[inline]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Get the element mutably, if this node is one.
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Get the element name, or `None` for text leaves.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.as_element().map(|e| e.name.as_str())
    }

    /// Check whether this node is an element with the given name.
    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name() == Some(name)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Qualified tag name, e.g. `w:tc`
    pub name: String,
    /// Attributes in document order
    pub attributes: Attributes,
    /// Children in document order
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder: append a child.
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: append a single text leaf.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Get attribute value by name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set attribute value, replacing an existing value in place so
    /// attribute order is kept.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Iterate over child elements, skipping text leaves.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element with the given name.
    pub fn find_first_child_by_name(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    /// First child element with the given name, mutably.
    pub fn find_first_child_by_name_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find(|e| e.name == name)
    }

    /// All child elements with the given name, in document order.
    pub fn find_all_children_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements().filter(move |e| e.name == name)
    }

    /// All child elements with the given name, mutably, in document order.
    pub fn find_all_children_by_name_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .filter(move |e| e.name == name)
    }

    /// Text of the first text leaf directly under this element.
    ///
    /// For a `w:t` element this is its content.
    pub fn text(&self) -> Option<&str> {
        self.children.iter().find_map(|child| match child {
            Node::Text(t) => Some(t.as_str()),
            Node::Element(_) => None,
        })
    }

    /// Mutable access to the first text leaf directly under this element.
    pub fn text_mut(&mut self) -> Option<&mut String> {
        self.children.iter_mut().find_map(|child| match child {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        })
    }

    /// Replace the content of a leaf element with a single text leaf.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(Node::Text(text.into()));
    }

    /// Concatenated text of this element and all descendants.
    pub fn text_recursive(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attr_keeps_order() {
        let mut shd = Element::new("w:shd")
            .with_attr("w:val", "clear")
            .with_attr("w:fill", "auto");
        shd.set_attr("w:val", "solid");
        shd.set_attr("w:color", "000000");

        let keys: Vec<&str> = shd.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["w:val", "w:fill", "w:color"]);
        assert_eq!(shd.attr("w:val"), Some("solid"));
        assert_eq!(shd.attr("w:missing"), None);
    }

    #[test]
    fn test_find_children_by_name() {
        let row = Element::new("w:tr")
            .with_child(Element::new("w:trPr"))
            .with_child(Element::new("w:tc").with_attr("id", "a"))
            .with_child(Node::text("stray"))
            .with_child(Element::new("w:tc").with_attr("id", "b"));

        let ids: Vec<&str> = row
            .find_all_children_by_name("w:tc")
            .filter_map(|c| c.attr("id"))
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(
            row.find_first_child_by_name("w:tc").and_then(|c| c.attr("id")),
            Some("a")
        );
        assert!(row.find_first_child_by_name("w:tbl").is_none());
    }

    #[test]
    fn test_text_accessors() {
        let mut t = Element::new("w:t");
        assert_eq!(t.text(), None);
        t.set_text("{name}");
        assert_eq!(t.text(), Some("{name}"));
        if let Some(text) = t.text_mut() {
            text.push('!');
        }
        assert_eq!(t.text(), Some("{name}!"));

        let p = Element::new("w:p")
            .with_child(Element::new("w:r").with_child(Element::new("w:t").with_text("Hello ")))
            .with_child(Element::new("w:r").with_child(Element::new("w:t").with_text("world")));
        assert_eq!(p.text_recursive(), "Hello world");
    }
}
