//! DOM Node - arena entry
//!
//! Links are `NodeId`s into the owning `DomTree` rather than pointers, so a
//! node can be referenced from findings and mutation records without
//! borrowing the tree.

use crate::NodeId;
use crate::shadow::ShadowRootData;
use url::Origin;

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE for documents, shadow roots and detached nodes)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(name: &str) -> Self {
        Self::new(NodeData::Element(ElementData::new(name)))
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self::new(NodeData::Text(content.to_string()))
    }

    /// Create a comment node
    pub fn comment(content: &str) -> Self {
        Self::new(NodeData::Comment(content.to_string()))
    }

    /// Create a document node
    pub fn document(url: &str, origin: Origin) -> Self {
        Self::new(NodeData::Document(DocumentData {
            url: url.to_string(),
            origin,
        }))
    }

    /// Create a shadow root node
    pub fn shadow_root(data: ShadowRootData) -> Self {
        Self::new(NodeData::ShadowRoot(data))
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Documents and shadow roots can parent other nodes but are never children
    #[inline]
    pub fn is_tree_root(&self) -> bool {
        matches!(self.data, NodeData::Document(_) | NodeData::ShadowRoot(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document(&self) -> Option<&DocumentData> {
        match &self.data {
            NodeData::Document(d) => Some(d),
            _ => None,
        }
    }

    #[inline]
    pub fn as_shadow_root(&self) -> Option<&ShadowRootData> {
        match &self.data {
            NodeData::ShadowRoot(s) => Some(s),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root (top-level or nested in a frame)
    Document(DocumentData),
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
    /// Shadow root attached to a host element
    ShadowRoot(ShadowRootData),
}

/// Document-specific data
#[derive(Debug, Clone)]
pub struct DocumentData {
    pub url: String,
    pub origin: Origin,
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase local name
    pub name: String,
    /// Attributes in source order, names lowercased
    pub attrs: Vec<Attribute>,
    /// Attached shadow root (open or closed)
    pub shadow_root: Option<NodeId>,
    /// Nested document of a frame element
    pub content_document: Option<NodeId>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            shadow_root: None,
            content_document: None,
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name.eq_ignore_ascii_case(name)) {
            return Some(std::mem::replace(&mut attr.value, value.to_string()));
        }
        self.attrs.push(Attribute {
            name: name.to_ascii_lowercase(),
            value: value.to_string(),
        });
        None
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).value)
    }

    /// `<iframe>` and `<frame>` can host a nested document
    #[inline]
    pub fn is_frame(&self) -> bool {
        self.name == "iframe" || self.name == "frame"
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_names_are_case_insensitive() {
        let mut elem = ElementData::new("DIV");
        assert_eq!(elem.name, "div");

        assert_eq!(elem.set_attr("Role", "button"), None);
        assert_eq!(elem.get_attr("role"), Some("button"));
        assert_eq!(elem.set_attr("ROLE", "link"), Some("button".to_string()));
        assert_eq!(elem.attrs.len(), 1);

        assert_eq!(elem.remove_attr("role"), Some("link".to_string()));
        assert!(!elem.has_attr("role"));
    }

    #[test]
    fn test_frame_detection() {
        assert!(ElementData::new("iframe").is_frame());
        assert!(ElementData::new("FRAME").is_frame());
        assert!(!ElementData::new("div").is_frame());
    }
}
