//! TreeWalker and element collection
//!
//! `TreeWalker` iterates the elements of a single tree scope in document
//! order, bounded to a root. `collect` builds on it to produce the full audit
//! sequence: it descends into open shadow roots and same-origin frame
//! documents, and treats every boundary it cannot cross as empty.

use crate::node::NodeData;
use crate::{DomTree, NodeId};
use std::collections::HashSet;

/// Element-only walker over one tree scope
///
/// Like the DOM `TreeWalker` with `SHOW_ELEMENT`, the root itself is never
/// yielded; iteration starts at its first descendant.
pub struct TreeWalker<'a> {
    tree: &'a DomTree,
    /// The root node of the traversal
    pub root: NodeId,
    current_node: NodeId,
}

impl<'a> TreeWalker<'a> {
    pub fn new(tree: &'a DomTree, root: NodeId) -> Self {
        Self {
            tree,
            root,
            current_node: root,
        }
    }

    /// Get the current node
    pub fn current_node(&self) -> NodeId {
        self.current_node
    }

    /// Advance to the next element in document order
    pub fn next_node(&mut self) -> Option<NodeId> {
        let mut cursor = self.current_node;
        loop {
            cursor = self.tree.next_in_preorder(cursor, self.root)?;
            if self.tree.get(cursor).is_some_and(|n| n.is_element()) {
                self.current_node = cursor;
                return Some(cursor);
            }
        }
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.next_node()
    }
}

/// Collect every element to audit under `root`
///
/// `root` may be a document (its body is walked), an element or a shadow
/// root. Each element appears once; an open shadow root's elements follow
/// the host immediately, then a readable frame's body descendants, then the
/// host's own descendants. The tree is never mutated and no state is kept
/// between calls.
pub fn collect(tree: &DomTree, root: NodeId) -> Vec<NodeId> {
    let mut collector = Collector {
        tree,
        seen: HashSet::new(),
        scopes: HashSet::new(),
        out: Vec::new(),
    };
    // A frame that loops back into the document being audited adds nothing
    if let Some(body) = tree.owner_document(root).and_then(|doc| tree.body_of(doc)) {
        if body != root && tree.is_inclusive_ancestor(body, root) {
            collector.scopes.insert(body);
        }
    }
    collector.walk(root);
    collector.out
}

struct Collector<'a> {
    tree: &'a DomTree,
    seen: HashSet<NodeId>,
    scopes: HashSet<NodeId>,
    out: Vec<NodeId>,
}

impl Collector<'_> {
    fn walk(&mut self, root: NodeId) {
        let tree = self.tree;
        let start = match tree.get(root).map(|n| &n.data) {
            Some(NodeData::Document(_)) => match tree.body_of(root) {
                Some(body) => body,
                None => return,
            },
            Some(NodeData::Element(_)) | Some(NodeData::ShadowRoot(_)) => root,
            _ => return,
        };
        if !self.scopes.insert(start) {
            tracing::trace!(scope = %start, "scope already walked");
            return;
        }

        for element in TreeWalker::new(tree, start) {
            if !self.seen.insert(element) {
                continue;
            }
            self.out.push(element);

            if let Some(shadow) = tree.open_shadow_root(element) {
                self.walk(shadow);
            } else if tree.shadow_root(element).is_some() {
                tracing::trace!(host = %element, "closed shadow root skipped");
            }

            let is_frame = tree
                .get(element)
                .and_then(|n| n.as_element())
                .is_some_and(|e| e.is_frame());
            if is_frame {
                match tree.content_document(element) {
                    Ok(Some(doc)) => self.walk(doc),
                    Ok(None) => tracing::trace!(frame = %element, "frame has no document"),
                    Err(err) => tracing::trace!(frame = %element, %err, "frame skipped"),
                }
            }
        }
    }
}
