//! AccessiFix DOM
//!
//! Arena-based document tree audited by the accessibility engine.
//!
//! The top-level document, every nested frame document and every shadow
//! root live in one arena and are addressed by [`NodeId`]. Nested documents
//! and shadow roots have no parent: they are reached through the element
//! that hosts them.

mod node;
mod tree;
mod document;
mod element;
mod shadow;
mod observer;
pub mod tree_walker;

pub use node::{Node, NodeData, ElementData, DocumentData, Attribute};
pub use tree::{DomTree, Descendants};
pub use document::Document;
pub use element::ElementRef;
pub use shadow::{ShadowRootData, ShadowRootMode};
pub use observer::{DisconnectQueue, MutationCallback, MutationObserverInit, MutationRecord, MutationType, ObserverId};
pub use tree_walker::{collect, TreeWalker};

use std::fmt;

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The top-level document node
    pub const ROOT: NodeId = NodeId(0);
    /// Null link
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Structural DOM errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("{0} does not exist")]
    NoSuchNode(NodeId),

    #[error("{0} is not an element")]
    NotAnElement(NodeId),

    #[error("{0} already hosts a shadow root")]
    ShadowRootExists(NodeId),

    #[error("<{tag}> cannot host a nested document")]
    NotAFrame { tag: String },

    #[error("{0} is not a document node")]
    NotADocument(NodeId),

    #[error("cannot insert {child} into {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("{reference} is not a child of {parent}")]
    NotAChild { parent: NodeId, reference: NodeId },
}

/// Failure to read a frame's nested document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("blocked cross-origin access from {from} to {to}")]
    CrossOrigin { from: String, to: String },

    #[error("{0} is not a frame element")]
    NotAFrame(NodeId),
}
