//! Node Operation Errors
//!
//! Structural errors raised by child-list mutation. These indicate a caller
//! bug and are never recovered from silently.

use crate::NodeId;

/// Result type for tree operations
pub type DomResult<T> = Result<T, DomError>;

/// Tree operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id does not belong to this tree
    #[error("node {0} not found")]
    NotFound(NodeId),

    /// Node is already attached to a parent
    #[error("node {node} already has parent {parent}")]
    HierarchyRequest { node: NodeId, parent: NodeId },

    /// Attaching would make a node its own ancestor
    #[error("node {node} is an ancestor of {destination}")]
    Cycle { node: NodeId, destination: NodeId },

    /// Node kind cannot take part in the requested relation
    #[error("invalid node type: {0}")]
    InvalidNodeType(&'static str),

    /// Reference node is not a child of the given parent
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
}
