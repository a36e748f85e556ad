//! Mutation Observers
//!
//! Registrations live inside the `DomTree`. Every mutating tree operation
//! produces one `MutationRecord` which is delivered synchronously to each
//! registration that selected it.

use crate::NodeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Callback invoked once per delivered record
pub type MutationCallback = Box<dyn FnMut(&MutationRecord)>;

/// Handle returned by `DomTree::observe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Disconnect requests for a tree that cannot be borrowed right now
///
/// Cloned out of the tree with `DomTree::disconnect_queue`. Queued
/// registrations stop receiving records at once and are dropped on the
/// tree's next mutable access.
#[derive(Debug, Clone, Default)]
pub struct DisconnectQueue(Rc<RefCell<Vec<ObserverId>>>);

impl DisconnectQueue {
    pub fn push(&self, id: ObserverId) {
        self.0.borrow_mut().push(id);
    }

    pub fn contains(&self, id: ObserverId) -> bool {
        self.0.borrow().contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn take(&self) -> Vec<ObserverId> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Structural and attribute changes anywhere below the target
    pub fn structure_and_attributes() -> Self {
        Self {
            child_list: true,
            attributes: true,
            subtree: true,
            ..Default::default()
        }
    }

    /// Whether the record's type (and attribute name) was selected
    pub fn wants(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::CharacterData => self.character_data,
            MutationType::Attributes => {
                if !self.attributes {
                    return false;
                }
                match (&self.attribute_filter, &record.attribute_name) {
                    (Some(filter), Some(name)) => filter.iter().any(|f| f.eq_ignore_ascii_case(name)),
                    _ => true,
                }
            }
        }
    }
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_ascii_lowercase()),
            old_value,
        }
    }

    pub fn character_data(target: NodeId, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::CharacterData,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: None,
            old_value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

pub(crate) struct Registration {
    pub(crate) id: ObserverId,
    pub(crate) target: NodeId,
    pub(crate) init: MutationObserverInit,
    callback: MutationCallback,
}

/// Observer registrations owned by a tree
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    registrations: Vec<Registration>,
    pending: DisconnectQueue,
}

impl ObserverRegistry {
    pub(crate) fn register(
        &mut self,
        target: NodeId,
        init: MutationObserverInit,
        callback: MutationCallback,
    ) -> ObserverId {
        self.prune();
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.registrations.push(Registration {
            id,
            target,
            init,
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let queued = self.pending.contains(id);
        self.prune();
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before || queued
    }

    /// Drop registrations whose disconnect was queued
    pub(crate) fn prune(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let queued = self.pending.take();
        self.registrations.retain(|r| !queued.contains(&r.id));
    }

    pub(crate) fn queue(&self) -> DisconnectQueue {
        self.pending.clone()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live registrations, not counting queued disconnects
    pub(crate) fn len(&self) -> usize {
        self.registrations
            .iter()
            .filter(|r| !self.pending.contains(r.id))
            .count()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub(crate) fn deliver(&mut self, ids: &[ObserverId], record: &MutationRecord) {
        for reg in self.registrations.iter_mut().filter(|r| ids.contains(&r.id)) {
            (reg.callback)(record);
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("next_id", &self.next_id)
            .field("registrations", &self.registrations.len())
            .field("pending", &self.pending)
            .finish()
    }
}
