//! Document - High-level document API

use crate::{DomTree, ElementRef, NodeId};
use crate::node::Node;
use url::Origin;

/// HTML Document
///
/// Owns the arena; nested frame documents and shadow roots are stored in the
/// same tree.
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
}

impl Document {
    /// Create a document with an `html`/`head`/`body` skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new(url);
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        // Fresh nodes under a fresh root: linking cannot fail
        let _ = tree.append_child(NodeId::ROOT, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);
        Self { tree }
    }

    /// Create a document with no structure
    pub fn empty(url: &str) -> Self {
        Self { tree: DomTree::new(url) }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        self.tree
            .get(NodeId::ROOT)
            .and_then(Node::as_document)
            .map(|d| d.url.as_str())
            .unwrap_or("about:blank")
    }

    /// Origin used for frame access checks
    pub fn origin(&self) -> Option<&Origin> {
        self.tree
            .get(NodeId::ROOT)
            .and_then(Node::as_document)
            .map(|d| &d.origin)
    }

    /// Get document title
    pub fn title(&self) -> String {
        self.head()
            .and_then(|head| {
                self.tree
                    .children(head)
                    .filter_map(|c| self.tree.element(c))
                    .find(|e| e.is("title"))
            })
            .map(|title| title.text_content().trim().to_string())
            .unwrap_or_default()
    }

    /// Get `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.tree.document_element(NodeId::ROOT)
    }

    /// Get `<head>` element
    pub fn head(&self) -> Option<NodeId> {
        self.tree.head_of(NodeId::ROOT)
    }

    /// Get `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        self.tree.body_of(NodeId::ROOT)
    }

    /// Get element by ID in the top-level document scope
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.get_element_by_id(NodeId::ROOT, id)
    }

    /// View an element
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.tree.element(id)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skeleton() {
        let doc = Document::new("https://example.com/page");
        assert_eq!(doc.url(), "https://example.com/page");
        let body = doc.body().unwrap();
        assert_eq!(doc.element(body).unwrap().tag_name(), "body");
        assert!(doc.head().is_some());
        assert_eq!(doc.title(), "");
    }

    #[test]
    fn test_title_and_lookup() {
        let mut doc = Document::new("about:blank");
        let head = doc.head().unwrap();
        let title = doc.tree.create_element("title");
        let text = doc.tree.create_text(" Audit me ");
        doc.tree.append_child(head, title).unwrap();
        doc.tree.append_child(title, text).unwrap();
        assert_eq!(doc.title(), "Audit me");

        let body = doc.body().unwrap();
        let main = doc.tree.create_element_with_attrs("main", &[("id", "main")]);
        doc.tree.append_child(body, main).unwrap();
        assert_eq!(doc.get_element_by_id("main"), Some(main));
        assert_eq!(doc.get_element_by_id("missing"), None);
    }

    #[test]
    fn test_empty_document_has_no_body() {
        let doc = Document::empty("about:blank");
        assert!(doc.body().is_none());
        assert_eq!(doc.tree().len(), 1);
    }
}
