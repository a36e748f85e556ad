//! DOM Tree (arena-based allocation)

use crate::node::{Node, NodeData};
use crate::observer::{
    DisconnectQueue, MutationCallback, MutationObserverInit, MutationRecord, ObserverId, ObserverRegistry,
};
use crate::shadow::{ShadowRootData, ShadowRootMode};
use crate::{AccessError, DomError, ElementRef, NodeId};
use url::{Origin, Url};

/// Arena-based DOM tree
///
/// Node 0 is always the top-level document. Nodes are never freed: removed
/// nodes stay in the arena detached, so stale `NodeId`s remain safe to look
/// up.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    observers: ObserverRegistry,
}

impl DomTree {
    /// Create a tree holding an empty top-level document
    pub fn new(url: &str) -> Self {
        Self {
            nodes: vec![Node::document(url, origin_of(url))],
            observers: ObserverRegistry::default(),
        }
    }

    /// The top-level document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.get(id).ok_or(DomError::NoSuchNode(id))
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // --- Creation (detached nodes, no mutation records) ---

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(Node::element(name))
    }

    /// Create an element with initial attributes
    pub fn create_element_with_attrs(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut node = Node::element(name);
        if let Some(elem) = node.as_element_mut() {
            for (attr, value) in attrs {
                elem.set_attr(attr, value);
            }
        }
        self.push(node)
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content))
    }

    /// Create a nested document; `origin` defaults to the URL's origin
    pub fn create_document(&mut self, url: &str, origin: Option<Origin>) -> NodeId {
        let origin = origin.unwrap_or_else(|| origin_of(url));
        self.push(Node::document(url, origin))
    }

    // --- Navigation ---

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Children of a node in order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        std::iter::from_fn(move || {
            if !next.is_valid() {
                return None;
            }
            let current = next;
            next = self.get(current).map(|n| n.next_sibling).unwrap_or(NodeId::NONE);
            Some(current)
        })
    }

    /// Preorder descendants of `id` within its tree scope (excluding `id`)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let first = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Descendants {
            tree: self,
            root: id,
            next: first,
        }
    }

    /// Next node in preorder, bounded to `root`'s subtree
    pub(crate) fn next_in_preorder(&self, current: NodeId, root: NodeId) -> Option<NodeId> {
        let node = self.get(current)?;
        if node.first_child.is_valid() {
            return Some(node.first_child);
        }
        let mut cursor = current;
        while cursor != root {
            let n = self.get(cursor)?;
            if n.next_sibling.is_valid() {
                return Some(n.next_sibling);
            }
            cursor = n.parent;
            if !cursor.is_valid() {
                return None;
            }
        }
        None
    }

    /// View an element node
    pub fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        ElementRef::new(self, id)
    }

    /// The document or shadow root at the top of `id`'s parent chain
    pub fn tree_scope_root(&self, id: NodeId) -> NodeId {
        let mut cursor = id;
        while let Some(parent) = self.parent(cursor) {
            cursor = parent;
        }
        cursor
    }

    /// Document owning `id`, looking through shadow roots to their hosts
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        let mut scope = self.tree_scope_root(id);
        loop {
            match &self.get(scope)?.data {
                NodeData::Document(_) => return Some(scope),
                NodeData::ShadowRoot(shadow) => scope = self.tree_scope_root(shadow.host),
                _ => return None,
            }
        }
    }

    /// Whether `id` is attached (through shadow hosts) to some document
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.owner_document(id).is_some()
    }

    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// `<html>` element of a document
    pub fn document_element(&self, doc: NodeId) -> Option<NodeId> {
        self.children(doc).find(|&c| self.tag_is(c, "html"))
    }

    /// `<body>` element of a document
    pub fn body_of(&self, doc: NodeId) -> Option<NodeId> {
        let html = self.document_element(doc)?;
        self.children(html).find(|&c| self.tag_is(c, "body"))
    }

    /// `<head>` element of a document
    pub fn head_of(&self, doc: NodeId) -> Option<NodeId> {
        let html = self.document_element(doc)?;
        self.children(html).find(|&c| self.tag_is(c, "head"))
    }

    fn tag_is(&self, id: NodeId, tag: &str) -> bool {
        self.get(id)
            .and_then(Node::as_element)
            .is_some_and(|e| e.name == tag)
    }

    /// First element in `scope` (document or shadow root) with the given id
    pub fn get_element_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.descendants(scope).find(|&n| {
            self.get(n)
                .and_then(Node::as_element)
                .and_then(|e| e.get_attr("id"))
                == Some(id)
        })
    }

    // --- Shadow roots and frames ---

    /// Attach a shadow root to `host`
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId, DomError> {
        let elem = self.node(host)?.as_element().ok_or(DomError::NotAnElement(host))?;
        if elem.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists(host));
        }
        let shadow = self.push(Node::shadow_root(ShadowRootData::new(host, mode)));
        if let Some(elem) = self.get_mut(host).and_then(Node::as_element_mut) {
            elem.shadow_root = Some(shadow);
        }
        Ok(shadow)
    }

    /// Attach a shadow root that came from a `<template shadowrootmode>`
    pub fn attach_declarative_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId, DomError> {
        let shadow = self.attach_shadow(host, mode)?;
        if let Some(NodeData::ShadowRoot(data)) = self.get_mut(shadow).map(|n| &mut n.data) {
            data.declarative = true;
        }
        Ok(shadow)
    }

    /// Shadow root of `host` regardless of mode
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.get(host)?.as_element()?.shadow_root
    }

    /// Shadow root of `host` if it is open
    pub fn open_shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let shadow = self.shadow_root(host)?;
        self.get(shadow)?
            .as_shadow_root()
            .filter(|s| s.is_open())
            .map(|_| shadow)
    }

    /// Host element of a shadow root
    pub fn shadow_host(&self, shadow: NodeId) -> Option<NodeId> {
        self.get(shadow)?.as_shadow_root().map(|s| s.host)
    }

    /// Load `doc` as the nested document of a frame element
    pub fn set_frame_document(&mut self, frame: NodeId, doc: NodeId) -> Result<(), DomError> {
        if self.node(doc)?.as_document().is_none() {
            return Err(DomError::NotADocument(doc));
        }
        let elem = self
            .get_mut(frame)
            .ok_or(DomError::NoSuchNode(frame))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(frame))?;
        if !elem.is_frame() {
            return Err(DomError::NotAFrame { tag: elem.name.clone() });
        }
        elem.content_document = Some(doc);
        Ok(())
    }

    /// Frame element whose nested document is `doc`
    pub fn frame_element(&self, doc: NodeId) -> Option<NodeId> {
        self.get(doc)?.as_document()?;
        self.nodes
            .iter()
            .position(|n| n.as_element().is_some_and(|e| e.content_document == Some(doc)))
            .map(|i| NodeId(i as u32))
    }

    /// Read a frame's nested document, enforcing the same-origin policy
    ///
    /// `Ok(None)` means the frame has nothing loaded.
    pub fn content_document(&self, frame: NodeId) -> Result<Option<NodeId>, AccessError> {
        let elem = self
            .get(frame)
            .and_then(Node::as_element)
            .filter(|e| e.is_frame())
            .ok_or(AccessError::NotAFrame(frame))?;
        let Some(doc) = elem.content_document else {
            return Ok(None);
        };
        let Some(inner) = self.get(doc).and_then(Node::as_document) else {
            return Ok(None);
        };
        let outer = self
            .owner_document(frame)
            .and_then(|d| self.get(d))
            .and_then(Node::as_document);
        match outer {
            Some(outer) if outer.origin == inner.origin => Ok(Some(doc)),
            Some(outer) => Err(AccessError::CrossOrigin {
                from: outer.origin.ascii_serialization(),
                to: inner.origin.ascii_serialization(),
            }),
            // A detached frame has no browsing context to compare against
            None => Ok(None),
        }
    }

    // --- Mutation ---

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let parent_node = self.node(parent)?;
        if parent_node.is_text() || matches!(parent_node.data, NodeData::Comment(_)) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        let child_node = self.node(child)?;
        if child_node.is_tree_root() || self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild { parent, reference });
            }
        }
        // Inserting a node before itself means before its next sibling
        let reference = match reference {
            Some(r) if r == child => Some(child_node.next_sibling).filter(|n| n.is_valid()),
            other => other,
        };

        if let Some(old_parent) = self.parent(child) {
            self.unlink(child);
            self.notify(MutationRecord::child_list(old_parent, Vec::new(), vec![child]));
        }
        self.link(parent, child, reference.unwrap_or(NodeId::NONE));
        self.notify(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    /// Detach `child` from its parent
    pub fn remove(&mut self, child: NodeId) -> Result<(), DomError> {
        self.node(child)?;
        let Some(parent) = self.parent(child) else {
            return Ok(());
        };
        self.unlink(child);
        self.notify(MutationRecord::child_list(parent, Vec::new(), vec![child]));
        Ok(())
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let elem = self
            .get_mut(id)
            .ok_or(DomError::NoSuchNode(id))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?;
        let old = elem.set_attr(name, value);
        self.notify(MutationRecord::attribute(id, name, old));
        Ok(())
    }

    /// Remove an attribute, returning its former value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let elem = self
            .get_mut(id)
            .ok_or(DomError::NoSuchNode(id))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))?;
        let old = elem.remove_attr(name);
        if old.is_some() {
            self.notify(MutationRecord::attribute(id, name, old.clone()));
        }
        Ok(old)
    }

    /// Replace the content of a text or comment node
    pub fn set_text(&mut self, id: NodeId, content: &str) -> Result<(), DomError> {
        let node = self.get_mut(id).ok_or(DomError::NoSuchNode(id))?;
        let old = match &mut node.data {
            NodeData::Text(text) | NodeData::Comment(text) => std::mem::replace(text, content.to_string()),
            _ => return Err(DomError::HierarchyRequest { parent: id, child: id }),
        };
        self.notify(MutationRecord::character_data(id, Some(old)));
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId, before: NodeId) {
        let prev = if before.is_valid() {
            self.nodes[before.index()].prev_sibling
        } else {
            self.nodes[parent.index()].last_child
        };

        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = before;
        }
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if before.is_valid() {
            self.nodes[before.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }
    }

    fn unlink(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let node = &self.nodes[child.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else if parent.is_valid() {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else if parent.is_valid() {
            self.nodes[parent.index()].last_child = prev;
        }
        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    // --- Observation ---

    /// Register a mutation callback on `target`
    pub fn observe(
        &mut self,
        target: NodeId,
        init: MutationObserverInit,
        callback: MutationCallback,
    ) -> ObserverId {
        self.observers.register(target, init, callback)
    }

    /// Remove a registration; returns whether it existed
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        self.observers.remove(id)
    }

    /// Number of live registrations
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Handle for disconnecting observers without borrowing the tree
    pub fn disconnect_queue(&self) -> DisconnectQueue {
        self.observers.queue()
    }

    fn notify(&mut self, record: MutationRecord) {
        self.observers.prune();
        if self.observers.is_empty() {
            return;
        }
        let interested: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|reg| reg.init.wants(&record))
            .filter(|reg| {
                reg.target == record.target
                    || (reg.init.subtree && self.is_inclusive_ancestor(reg.target, record.target))
            })
            .map(|reg| reg.id)
            .collect();
        if !interested.is_empty() {
            tracing::trace!(?record.mutation_type, node = %record.target, observers = interested.len(), "delivering mutation");
            self.observers.deliver(&interested, &record);
        }
    }
}

/// Preorder iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = self
            .tree
            .next_in_preorder(current, self.root)
            .unwrap_or(NodeId::NONE);
        Some(current)
    }
}

/// Origin of a URL; unparsable URLs get a fresh opaque origin
pub(crate) fn origin_of(url: &str) -> Origin {
    match Url::parse(url) {
        Ok(parsed) => parsed.origin(),
        Err(_) => Origin::new_opaque(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn skeleton() -> (DomTree, NodeId) {
        let mut tree = DomTree::new("https://example.com/");
        let html = tree.create_element("html");
        let body = tree.create_element("body");
        tree.append_child(NodeId::ROOT, html).unwrap();
        tree.append_child(html, body).unwrap();
        (tree, body)
    }

    #[test]
    fn test_append_and_children() {
        let (mut tree, body) = skeleton();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.append_child(body, a).unwrap();
        tree.append_child(body, c).unwrap();
        tree.insert_before(body, b, Some(c)).unwrap();

        let children: Vec<_> = tree.children(body).collect();
        assert_eq!(children, vec![a, b, c]);
        assert_eq!(tree.body_of(NodeId::ROOT), Some(body));
    }

    #[test]
    fn test_remove_relinks_siblings() {
        let (mut tree, body) = skeleton();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        for n in [a, b, c] {
            tree.append_child(body, n).unwrap();
        }
        tree.remove(b).unwrap();
        assert_eq!(tree.children(body).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(tree.parent(b), None);
        assert!(!tree.is_connected(b));

        tree.remove(c).unwrap();
        tree.remove(a).unwrap();
        assert_eq!(tree.children(body).count(), 0);
    }

    #[test]
    fn test_hierarchy_errors() {
        let (mut tree, body) = skeleton();
        let div = tree.create_element("div");
        tree.append_child(body, div).unwrap();
        assert!(matches!(
            tree.append_child(div, body),
            Err(DomError::HierarchyRequest { .. })
        ));
        let doc = tree.create_document("about:blank", None);
        assert!(tree.append_child(div, doc).is_err());
        let stray = tree.create_element("span");
        assert!(matches!(
            tree.insert_before(body, div, Some(stray)),
            Err(DomError::NotAChild { .. })
        ));
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, body) = skeleton();
        let outer = tree.create_element("div");
        let inner = tree.create_element("span");
        let text = tree.create_text("hi");
        let after = tree.create_element("p");
        tree.append_child(body, outer).unwrap();
        tree.append_child(outer, inner).unwrap();
        tree.append_child(inner, text).unwrap();
        tree.append_child(body, after).unwrap();

        let order: Vec<_> = tree.descendants(body).collect();
        assert_eq!(order, vec![outer, inner, text, after]);
        let scoped: Vec<_> = tree.descendants(outer).collect();
        assert_eq!(scoped, vec![inner, text]);
    }

    #[test]
    fn test_shadow_roots() {
        let (mut tree, body) = skeleton();
        let host = tree.create_element("div");
        tree.append_child(body, host).unwrap();
        let shadow = tree.attach_shadow(host, ShadowRootMode::Open).unwrap();
        assert_eq!(tree.open_shadow_root(host), Some(shadow));
        assert_eq!(tree.attach_shadow(host, ShadowRootMode::Open), Err(DomError::ShadowRootExists(host)));

        let inside = tree.create_element("button");
        tree.append_child(shadow, inside).unwrap();
        assert_eq!(tree.tree_scope_root(inside), shadow);
        assert_eq!(tree.owner_document(inside), Some(NodeId::ROOT));

        let closed_host = tree.create_element("div");
        tree.append_child(body, closed_host).unwrap();
        tree.attach_shadow(closed_host, ShadowRootMode::Closed).unwrap();
        assert!(tree.shadow_root(closed_host).is_some());
        assert_eq!(tree.open_shadow_root(closed_host), None);
    }

    #[test]
    fn test_frame_origin_policy() {
        let (mut tree, body) = skeleton();
        let same = tree.create_element("iframe");
        let other = tree.create_element("iframe");
        let empty = tree.create_element("iframe");
        for f in [same, other, empty] {
            tree.append_child(body, f).unwrap();
        }
        let same_doc = tree.create_document("https://example.com/inner", None);
        let other_doc = tree.create_document("https://ads.example.net/", None);
        tree.set_frame_document(same, same_doc).unwrap();
        tree.set_frame_document(other, other_doc).unwrap();

        assert_eq!(tree.content_document(same), Ok(Some(same_doc)));
        assert!(matches!(tree.content_document(other), Err(AccessError::CrossOrigin { .. })));
        assert_eq!(tree.content_document(empty), Ok(None));
        assert_eq!(tree.content_document(body), Err(AccessError::NotAFrame(body)));

        let div = tree.create_element("div");
        assert!(matches!(
            tree.set_frame_document(div, same_doc),
            Err(DomError::NotAFrame { .. })
        ));
    }

    #[test]
    fn test_observers_see_subtree_mutations() {
        let (mut tree, body) = skeleton();
        let records = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&records);
        let id = tree.observe(
            body,
            MutationObserverInit::structure_and_attributes(),
            Box::new(move |record| sink.borrow_mut().push(record.clone())),
        );

        let div = tree.create_element("div");
        tree.append_child(body, div).unwrap();
        tree.set_attribute(div, "role", "button").unwrap();
        let text = tree.create_text("x");
        tree.append_child(div, text).unwrap();
        tree.set_text(text, "y").unwrap();

        {
            let seen = records.borrow();
            assert_eq!(seen.len(), 3);
            assert_eq!(seen[0], MutationRecord::child_list(body, vec![div], vec![]));
            assert_eq!(seen[1].attribute_name.as_deref(), Some("role"));
        }

        assert!(tree.disconnect(id));
        tree.remove(div).unwrap();
        assert_eq!(records.borrow().len(), 3);
        assert_eq!(tree.observer_count(), 0);
    }

    #[test]
    fn test_frame_element_lookup() {
        let (mut tree, body) = skeleton();
        let frame = tree.create_element("iframe");
        tree.append_child(body, frame).unwrap();
        let nested = tree.create_document("about:srcdoc", None);
        tree.set_frame_document(frame, nested).unwrap();

        assert_eq!(tree.frame_element(nested), Some(frame));
        assert_eq!(tree.frame_element(NodeId::ROOT), None);
        assert_eq!(tree.frame_element(body), None);
    }

    #[test]
    fn test_observers_ignore_shadow_scopes() {
        let (mut tree, body) = skeleton();
        let host = tree.create_element("div");
        tree.append_child(body, host).unwrap();
        let shadow = tree.attach_shadow(host, ShadowRootMode::Open).unwrap();

        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        tree.observe(
            body,
            MutationObserverInit::structure_and_attributes(),
            Box::new(move |_| *sink.borrow_mut() += 1),
        );
        let inner = tree.create_element("span");
        tree.append_child(shadow, inner).unwrap();
        assert_eq!(*count.borrow(), 0);
    }
}
