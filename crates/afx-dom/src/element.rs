//! Element views
//!
//! `ElementRef` is a borrowed, read-only handle on one element. Rules see the
//! tree exclusively through it.

use crate::node::{ElementData, Node, NodeData};
use crate::{DomTree, NodeId};
use std::fmt;

/// Read-only view of an element node
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    tree: &'a DomTree,
    id: NodeId,
    data: &'a ElementData,
}

impl<'a> ElementRef<'a> {
    /// Wrap `id` if it names an element
    pub fn new(tree: &'a DomTree, id: NodeId) -> Option<Self> {
        let data = tree.get(id)?.as_element()?;
        Some(Self { tree, id, data })
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn tree(&self) -> &'a DomTree {
        self.tree
    }

    #[inline]
    pub fn data(&self) -> &'a ElementData {
        self.data
    }

    /// Lowercase local name
    #[inline]
    pub fn tag_name(&self) -> &'a str {
        &self.data.name
    }

    #[inline]
    pub fn is(&self, tag: &str) -> bool {
        self.data.name.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.data.get_attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.data.has_attr(name)
    }

    /// Attributes as (name, value) pairs
    pub fn attrs(self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.data.attrs.iter().map(|a| (a.name.as_str(), a.value.as_str()))
    }

    /// Class list
    pub fn classes(self) -> impl Iterator<Item = &'a str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Parent element within the same tree scope
    pub fn parent_element(&self) -> Option<ElementRef<'a>> {
        self.tree.parent(self.id).and_then(|p| ElementRef::new(self.tree, p))
    }

    /// Parent element, continuing from a shadow root to its host
    pub fn composed_parent(&self) -> Option<ElementRef<'a>> {
        let parent = self.tree.parent(self.id)?;
        match &self.tree.get(parent)?.data {
            NodeData::Element(_) => ElementRef::new(self.tree, parent),
            NodeData::ShadowRoot(shadow) => ElementRef::new(self.tree, shadow.host),
            _ => None,
        }
    }

    /// Child elements in order
    pub fn child_elements(self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let tree = self.tree;
        tree.children(self.id).filter_map(move |c| ElementRef::new(tree, c))
    }

    /// Descendant elements in document order (same tree scope)
    pub fn descendant_elements(self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let tree = self.tree;
        tree.descendants(self.id).filter_map(move |c| ElementRef::new(tree, c))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        self.tree
            .descendants(self.id)
            .filter_map(|n| self.tree.get(n).and_then(Node::as_text))
            .collect()
    }

    /// Whether a direct child text node carries non-whitespace text
    pub fn has_own_text(&self) -> bool {
        self.tree
            .children(self.id)
            .filter_map(|n| self.tree.get(n).and_then(Node::as_text))
            .any(|t| !t.trim().is_empty())
    }

    /// Document or shadow root this element belongs to
    pub fn scope_root(&self) -> NodeId {
        self.tree.tree_scope_root(self.id)
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}", self.data.name, self.id)
    }
}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for ElementRef<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShadowRootMode;

    #[test]
    fn test_element_view() {
        let mut tree = DomTree::new("about:blank");
        let div = tree.create_element_with_attrs("div", &[("class", "a  b"), ("id", "x")]);
        let span = tree.create_element("span");
        let text = tree.create_text("  hello ");
        tree.append_child(NodeId::ROOT, div).unwrap();
        tree.append_child(div, span).unwrap();
        tree.append_child(span, text).unwrap();

        let el = tree.element(div).unwrap();
        assert_eq!(el.tag_name(), "div");
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(el.text_content(), "  hello ");
        assert!(!el.has_own_text());
        assert!(tree.element(span).unwrap().has_own_text());
        assert_eq!(tree.element(span).unwrap().parent_element(), Some(el));
        assert!(tree.element(text).is_none());
    }

    #[test]
    fn test_composed_parent_crosses_shadow_boundary() {
        let mut tree = DomTree::new("about:blank");
        let host = tree.create_element("x-widget");
        tree.append_child(NodeId::ROOT, host).unwrap();
        let shadow = tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let inner = tree.create_element("button");
        tree.append_child(shadow, inner).unwrap();

        let el = tree.element(inner).unwrap();
        assert!(el.parent_element().is_none());
        assert_eq!(el.composed_parent().map(|p| p.id()), Some(host));
        assert_eq!(el.scope_root(), shadow);
    }
}
