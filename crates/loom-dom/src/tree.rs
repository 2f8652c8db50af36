//! Virtual Tree (arena-based allocation)
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`].
//! Every child-list mutation keeps parent back-references consistent and
//! rejects anything that would give a node two parents or make it its own
//! ancestor.

use crate::{DomError, DomResult, NodeId, VNode};

/// Arena-based tree of virtual nodes
#[derive(Debug, Clone, Default)]
pub struct VTree {
    nodes: Vec<VNode>,
}

impl VTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&VNode> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut VNode> {
        self.nodes.get_mut(id.index())
    }

    fn node(&self, id: NodeId) -> DomResult<&VNode> {
        self.get(id).ok_or(DomError::NotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut VNode> {
        self.get_mut(id).ok_or(DomError::NotFound(id))
    }

    /// Add a detached node to the arena.
    ///
    /// Parent and path are reset; the node's own child list is expected to
    /// be empty, which holds for every node built outside a tree.
    pub fn push(&mut self, mut node: VNode) -> NodeId {
        node.parent = None;
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(VNode::element(tag))
    }

    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(VNode::text(content))
    }

    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(VNode::comment(content))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(VNode::fragment())
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of a node (empty for leaves and unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(VNode::children).unwrap_or(&[])
    }

    /// Check whether `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Validate that `child` may be attached under `parent`
    fn check_attach(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        let parent_node = self.node(parent)?;
        let child_node = self.node(child)?;

        if !parent_node.is_parent_node() {
            return Err(DomError::InvalidNodeType("node cannot have children"));
        }
        if !child_node.is_child_node() {
            return Err(DomError::InvalidNodeType("fragment cannot be a child"));
        }
        if let Some(existing) = child_node.parent {
            return Err(DomError::HierarchyRequest { node: child, parent: existing });
        }
        if child == parent || self.is_ancestor(child, parent) {
            tracing::debug!("Rejected attaching {} under its own descendant {}", child, parent);
            return Err(DomError::Cycle { node: child, destination: parent });
        }
        Ok(())
    }

    fn position_of(&self, parent: NodeId, child: NodeId) -> DomResult<usize> {
        self.node(parent)?
            .children()
            .iter()
            .position(|&c| c == child)
            .ok_or(DomError::NotAChild { parent, child })
    }

    fn insert_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> DomResult<()> {
        let list = self
            .node_mut(parent)?
            .child_list_mut()
            .ok_or(DomError::InvalidNodeType("node cannot have children"))?;
        list.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Append a child node
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_attach(parent, child)?;
        let index = self.children(parent).len();
        self.insert_at(parent, child, index)
    }

    /// Insert a child before all others
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_attach(parent, child)?;
        self.insert_at(parent, child, 0)
    }

    /// Insert before a reference child
    pub fn insert_before(&mut self, parent: NodeId, new_child: NodeId, reference: NodeId) -> DomResult<()> {
        self.check_attach(parent, new_child)?;
        let index = self.position_of(parent, reference)?;
        self.insert_at(parent, new_child, index)
    }

    /// Insert after a reference child
    pub fn insert_after(&mut self, parent: NodeId, new_child: NodeId, reference: NodeId) -> DomResult<()> {
        self.check_attach(parent, new_child)?;
        let index = self.position_of(parent, reference)?;
        self.insert_at(parent, new_child, index + 1)
    }

    /// Replace `old_child` with `new_child`, returning the detached old child
    pub fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> DomResult<NodeId> {
        self.check_attach(parent, new_child)?;
        let index = self.position_of(parent, old_child)?;
        if let Some(list) = self.node_mut(parent)?.child_list_mut() {
            list[index] = new_child;
        }
        self.node_mut(new_child)?.parent = Some(parent);
        self.node_mut(old_child)?.parent = None;
        Ok(old_child)
    }

    /// Remove a child node, leaving it detached in the arena
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        let index = self.position_of(parent, child)?;
        if let Some(list) = self.node_mut(parent)?.child_list_mut() {
            list.remove(index);
        }
        self.node_mut(child)?.parent = None;
        Ok(child)
    }

    /// Detach a node from its parent, if it has one
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        if let Some(parent) = self.node(id)?.parent {
            self.remove_child(parent, id)?;
        }
        Ok(())
    }

    /// Clone a node within this tree.
    ///
    /// The clone is parentless and has no path. `deep` clones the whole
    /// subtree; otherwise only the node's own state is copied.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> DomResult<NodeId> {
        let copy = self.node(id)?.shallow_clone();
        let children = if deep { self.children(id).to_vec() } else { Vec::new() };
        let new_id = self.push(copy);
        for child in children {
            let cloned = self.clone_node(child, true)?;
            self.insert_at(new_id, cloned, self.children(new_id).len())?;
        }
        Ok(new_id)
    }

    /// Clone a node from another tree into this one
    pub fn import_node(&mut self, source: &VTree, id: NodeId, deep: bool) -> DomResult<NodeId> {
        let node = source.node(id)?;
        let new_id = self.push(node.shallow_clone());
        if deep {
            for &child in node.children() {
                let cloned = self.import_node(source, child, true)?;
                self.insert_at(new_id, cloned, self.children(new_id).len())?;
            }
        }
        Ok(new_id)
    }

    /// Pre-order list of `id` and everything below it
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of all text descendants
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.get(n) {
                Some(node) if node.kind() == crate::NodeKind::Text => node.text_content(),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (VTree, NodeId, NodeId, NodeId) {
        let mut tree = VTree::new();
        let root = tree.create_fragment();
        let div = tree.create_element("div");
        let span = tree.create_element("span");
        tree.append_child(root, div).unwrap();
        tree.append_child(div, span).unwrap();
        (tree, root, div, span)
    }

    #[test]
    fn test_append_sets_parent() {
        let (tree, root, div, span) = sample();
        assert_eq!(tree.parent(div), Some(root));
        assert_eq!(tree.parent(span), Some(div));
        assert_eq!(tree.children(div), &[span]);
    }

    #[test]
    fn test_attach_already_parented_fails() {
        let (mut tree, root, _div, span) = sample();
        let err = tree.append_child(root, span).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
    }

    #[test]
    fn test_attach_ancestor_fails() {
        let (mut tree, _root, div, span) = sample();
        tree.detach(div).unwrap();
        let err = tree.append_child(span, div).unwrap_err();
        assert_eq!(err, DomError::Cycle { node: div, destination: span });

        let err = tree.append_child(div, div).unwrap_err();
        assert!(matches!(err, DomError::Cycle { .. }));
    }

    #[test]
    fn test_fragment_cannot_be_child() {
        let mut tree = VTree::new();
        let a = tree.create_fragment();
        let b = tree.create_fragment();
        assert!(matches!(tree.append_child(a, b), Err(DomError::InvalidNodeType(_))));
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut tree = VTree::new();
        let text = tree.create_text("x");
        let el = tree.create_element("b");
        assert!(matches!(tree.append_child(text, el), Err(DomError::InvalidNodeType(_))));
    }

    #[test]
    fn test_insert_before_after_prepend() {
        let mut tree = VTree::new();
        let ul = tree.create_element("ul");
        let a = tree.create_element("li");
        let b = tree.create_element("li");
        let c = tree.create_element("li");
        let d = tree.create_element("li");

        tree.append_child(ul, b).unwrap();
        tree.insert_before(ul, a, b).unwrap();
        tree.insert_after(ul, d, b).unwrap();
        tree.insert_before(ul, c, d).unwrap();
        assert_eq!(tree.children(ul), &[a, b, c, d]);

        let e = tree.create_element("li");
        tree.prepend_child(ul, e).unwrap();
        assert_eq!(tree.children(ul)[0], e);
    }

    #[test]
    fn test_insert_before_non_child_reference() {
        let mut tree = VTree::new();
        let ul = tree.create_element("ul");
        let stray = tree.create_element("li");
        let li = tree.create_element("li");
        assert!(matches!(tree.insert_before(ul, li, stray), Err(DomError::NotAChild { .. })));
        assert_eq!(tree.parent(li), None);
    }

    #[test]
    fn test_replace_and_remove() {
        let (mut tree, _root, div, span) = sample();
        let p = tree.create_element("p");

        assert_eq!(tree.replace_child(div, p, span).unwrap(), span);
        assert_eq!(tree.parent(span), None);
        assert_eq!(tree.parent(p), Some(div));

        tree.remove_child(div, p).unwrap();
        assert!(tree.children(div).is_empty());
        assert!(tree.remove_child(div, p).is_err());
    }

    #[test]
    fn test_clone_shallow_and_deep() {
        let (mut tree, _root, div, _span) = sample();
        tree.get_mut(div).unwrap().attributes_mut().unwrap().set("id", "x");

        let shallow = tree.clone_node(div, false).unwrap();
        assert!(tree.children(shallow).is_empty());
        assert_eq!(tree.parent(shallow), None);
        assert_eq!(tree.get(shallow).unwrap().attributes().unwrap().get("id"), Some("x"));

        let deep = tree.clone_node(div, true).unwrap();
        assert_eq!(tree.children(deep).len(), 1);
        let cloned_span = tree.children(deep)[0];
        assert_eq!(tree.parent(cloned_span), Some(deep));
        assert_ne!(cloned_span, tree.children(div)[0]);
    }

    #[test]
    fn test_import_node() {
        let (source, root, _div, _span) = sample();
        let mut dest = VTree::new();
        let copy = dest.import_node(&source, root, true).unwrap();
        assert_eq!(dest.descendants(copy).len(), 3);
    }
}
