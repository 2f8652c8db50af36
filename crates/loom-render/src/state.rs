//! Render state arena
//!
//! Per-path record of what was last committed for a node: its host node,
//! a shallow snapshot of its own state, and its committed child list.

use crate::host::HostNodeId;
use loom_dom::VNode;
use loom_dom::path;
use std::collections::HashMap;

/// What the reconciler remembers about one path
#[derive(Debug, Clone)]
pub struct RenderState {
    pub host: HostNodeId,
    /// Childless copy of the node as last committed
    pub snapshot: VNode,
    /// Host children in committed order
    pub children: Vec<HostNodeId>,
    pub parent: Option<HostNodeId>,
}

/// Render states keyed by structural path
#[derive(Debug, Default)]
pub struct StateArena {
    states: HashMap<String, RenderState>,
}

impl StateArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&RenderState> {
        self.states.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut RenderState> {
        self.states.get_mut(path)
    }

    pub fn insert(&mut self, path: String, state: RenderState) -> Option<RenderState> {
        self.states.insert(path, state)
    }

    pub fn remove(&mut self, path: &str) -> Option<RenderState> {
        self.states.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.states.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Host node recorded for a path
    pub fn host(&self, path: &str) -> Option<HostNodeId> {
        self.states.get(path).map(|s| s.host)
    }

    /// All paths, sorted so ancestors precede their descendants
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.states.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Sorted paths strictly below `ancestor`
    pub fn descendants_of(&self, ancestor: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .states
            .keys()
            .filter(|p| path::is_descendant(p, ancestor))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Sorted paths directly below `parent`
    pub fn children_of(&self, parent: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .states
            .keys()
            .filter(|p| path::is_child(p, parent))
            .cloned()
            .collect();
        paths.sort();
        paths
    }

    /// Drop the states of everything below `ancestor`; returns how many
    pub fn remove_descendants(&mut self, ancestor: &str) -> usize {
        let before = self.states.len();
        self.states.retain(|p, _| !path::is_descendant(p, ancestor));
        before - self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n: u32) -> RenderState {
        RenderState {
            host: HostNodeId(n),
            snapshot: VNode::fragment(),
            children: Vec::new(),
            parent: None,
        }
    }

    #[test]
    fn test_queries() {
        let mut arena = StateArena::new();
        for (i, p) in ["root", "root/element:0", "root/element:0/text:0", "root/element:1"]
            .iter()
            .enumerate()
        {
            arena.insert(p.to_string(), state(i as u32));
        }

        assert_eq!(arena.children_of("root"), vec!["root/element:0", "root/element:1"]);
        assert_eq!(arena.descendants_of("root/element:0"), vec!["root/element:0/text:0"]);
        assert_eq!(arena.host("root/element:1"), Some(HostNodeId(3)));

        assert_eq!(arena.remove_descendants("root"), 3);
        assert_eq!(arena.paths(), vec!["root"]);
    }
}
