//! Structural paths
//!
//! A node's path is its parent's path, its kind and the number of
//! same-kind siblings produced before it: `root/element:0/text:1`.

use crate::NodeKind;

/// Default path of the instance root
pub const DEFAULT_ROOT_KEY: &str = "root";

/// Path of a child
pub fn child_path(parent: &str, kind: NodeKind, index: u32) -> String {
    format!("{}/{}:{}", parent, kind.as_str(), index)
}

/// Whether `path` lies strictly below `ancestor`
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len() + 1
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Whether `path` is a direct child of `parent`
pub fn is_child(path: &str, parent: &str) -> bool {
    is_descendant(path, parent) && !path[parent.len() + 1..].contains('/')
}

/// Per-parent occurrence counters, one per node kind
#[derive(Debug, Default, Clone)]
pub struct PathCounter {
    counts: [u32; 4],
}

impl PathCounter {
    fn slot(kind: NodeKind) -> usize {
        match kind {
            NodeKind::Element => 0,
            NodeKind::Text => 1,
            NodeKind::Comment => 2,
            NodeKind::Fragment => 3,
        }
    }

    /// Index the next node of `kind` would receive
    pub fn peek(&self, kind: NodeKind) -> u32 {
        self.counts[Self::slot(kind)]
    }

    /// Claim the next index for `kind`
    pub fn next(&mut self, kind: NodeKind) -> u32 {
        let slot = &mut self.counts[Self::slot(kind)];
        let index = *slot;
        *slot += 1;
        index
    }
}
