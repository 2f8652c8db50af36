//! Loom DOM - Virtual node model
//!
//! Arena-backed tree of virtual nodes (element, text, comment, fragment).
//! Algorithms ask nodes what they can do (attributes, events, children,
//! text) instead of matching on the concrete kind.

mod attributes;
mod events;
mod node;
mod operations;
pub mod path;
mod serialize;
mod tree;

pub use attributes::AttributeBag;
pub use events::{Callback, CallbackId, Event, EventRegistrations, Listener, ListenerOptions};
pub use node::{
    AttributeNode, Comment, Element, EventNode, Fragment, NodeData, NodeKind, ParentNode, Text,
    TextNode, VNode,
};
pub use operations::{DomError, DomResult};
pub use serialize::{VOID_ELEMENTS, is_void_element};
pub use tree::VTree;

/// Node identifier (index into a [`VTree`] arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
