//! Mutation Actions
//!
//! Pending host mutations, coalesced per slot. A slot is the exact
//! (host node, category, sub-key) a mutation targets; only the latest action
//! per slot survives until the queue is drained.

use crate::host::{HostError, HostNodeId, HostTree};
use indexmap::IndexMap;
use loom_dom::{CallbackId, Listener};
use std::cell::RefCell;
use std::rc::Rc;

/// What part of a host node an action touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionCategory {
    Attribute,
    Listener,
    Text,
    Placement,
    Removal,
}

/// Coalescing key of an action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionSlot {
    pub node: HostNodeId,
    pub category: ActionCategory,
    pub key: String,
}

/// One host mutation waiting to be committed
#[derive(Debug, Clone, PartialEq)]
pub enum MutationAction {
    SetAttribute { node: HostNodeId, name: String, value: String },
    RemoveAttribute { node: HostNodeId, name: String },
    AddListener { node: HostNodeId, listener: Listener },
    RemoveListener { node: HostNodeId, event_type: String, id: CallbackId },
    SetText { node: HostNodeId, text: String },
    Insert { parent: HostNodeId, child: HostNodeId, before: Option<HostNodeId> },
    Remove { node: HostNodeId },
}

impl MutationAction {
    pub fn slot(&self) -> ActionSlot {
        let (node, category, key) = match self {
            MutationAction::SetAttribute { node, name, .. }
            | MutationAction::RemoveAttribute { node, name } => {
                (*node, ActionCategory::Attribute, name.clone())
            }
            MutationAction::AddListener { node, listener } => (
                *node,
                ActionCategory::Listener,
                listener_key(&listener.event_type, listener.callback.id()),
            ),
            MutationAction::RemoveListener { node, event_type, id } => {
                (*node, ActionCategory::Listener, listener_key(event_type, *id))
            }
            MutationAction::SetText { node, .. } => (*node, ActionCategory::Text, String::new()),
            MutationAction::Insert { child, .. } => (*child, ActionCategory::Placement, String::new()),
            MutationAction::Remove { node } => (*node, ActionCategory::Removal, String::new()),
        };
        ActionSlot { node, category, key }
    }

    pub fn category(&self) -> ActionCategory {
        self.slot().category
    }

    /// Perform the mutation against a host
    pub fn apply<H: HostTree + ?Sized>(&self, host: &mut H) -> Result<(), HostError> {
        match self {
            MutationAction::SetAttribute { node, name, value } => host.set_attribute(*node, name, value),
            MutationAction::RemoveAttribute { node, name } => host.remove_attribute(*node, name),
            MutationAction::AddListener { node, listener } => host.add_listener(*node, listener),
            MutationAction::RemoveListener { node, event_type, id } => {
                host.remove_listener(*node, event_type, *id)
            }
            MutationAction::SetText { node, text } => host.set_text(*node, text),
            MutationAction::Insert { parent, child, before } => host.insert_before(*parent, *child, *before),
            MutationAction::Remove { node } => host.remove(*node),
        }
    }
}

fn listener_key(event_type: &str, id: CallbackId) -> String {
    format!("{}#{}", event_type, id.0)
}

/// Slot-coalescing action queue
#[derive(Debug, Default)]
pub struct ActionQueue {
    actions: IndexMap<ActionSlot, MutationAction>,
    coalesced: usize,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an action, replacing any pending action for the same slot.
    /// The slot moves to the end of the queue.
    pub fn push(&mut self, action: MutationAction) {
        let slot = action.slot();
        if self.actions.shift_remove(&slot).is_some() {
            self.coalesced += 1;
        }
        self.actions.insert(slot, action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of actions superseded before they were committed
    pub fn coalesced(&self) -> usize {
        self.coalesced
    }

    pub fn iter(&self) -> impl Iterator<Item = &MutationAction> {
        self.actions.values()
    }

    /// Take every pending action in commit order
    pub fn drain(&mut self) -> Vec<MutationAction> {
        self.actions.drain(..).map(|(_, action)| action).collect()
    }
}

/// Shared handle to an [`ActionQueue`]
///
/// Listener callbacks and host adapters may hold a clone and enqueue while
/// a flush is committing; the flush keeps draining until the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct MutationSink {
    queue: Rc<RefCell<ActionQueue>>,
}

impl MutationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, action: MutationAction) {
        self.queue.borrow_mut().push(action);
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn coalesced(&self) -> usize {
        self.queue.borrow().coalesced()
    }

    /// Copy of the pending actions, in commit order
    pub fn pending(&self) -> Vec<MutationAction> {
        self.queue.borrow().iter().cloned().collect()
    }

    pub fn drain(&self) -> Vec<MutationAction> {
        self.queue.borrow_mut().drain()
    }
}
