//! Host Visual Tree
//!
//! The reconciler never touches a concrete UI toolkit. It drives an injected
//! [`HostTree`] through node handles; [`MemoryHost`] is an in-memory
//! implementation that records every mutation.

use indexmap::IndexMap;
use loom_dom::{CallbackId, Event, Listener, is_void_element};
use std::fmt;

/// Handle to a node owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNodeId(pub u32);

impl fmt::Display for HostNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// Host operation failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Unknown host node {0}")]
    UnknownNode(HostNodeId),

    #[error("Host node {0} cannot have children")]
    NotAContainer(HostNodeId),

    #[error("Host node {0} cannot hold {1}")]
    Unsupported(HostNodeId, &'static str),

    #[error("{reference} is not a child of {parent}")]
    NotAChild { parent: HostNodeId, reference: HostNodeId },

    #[error("Inserting {node} into {parent} would create a cycle")]
    Cycle { node: HostNodeId, parent: HostNodeId },
}

/// Host visual-tree capability
pub trait HostTree {
    fn create_element(&mut self, tag: &str) -> HostNodeId;
    fn create_text(&mut self, text: &str) -> HostNodeId;
    fn create_comment(&mut self, text: &str) -> HostNodeId;
    fn create_fragment(&mut self) -> HostNodeId;

    fn set_attribute(&mut self, node: HostNodeId, name: &str, value: &str) -> Result<(), HostError>;
    fn remove_attribute(&mut self, node: HostNodeId, name: &str) -> Result<(), HostError>;

    fn add_listener(&mut self, node: HostNodeId, listener: &Listener) -> Result<(), HostError>;
    fn remove_listener(&mut self, node: HostNodeId, event_type: &str, id: CallbackId) -> Result<(), HostError>;

    fn set_text(&mut self, node: HostNodeId, text: &str) -> Result<(), HostError>;

    /// Insert (or move) `child` under `parent`, before `before` or at the end
    fn insert_before(
        &mut self,
        parent: HostNodeId,
        child: HostNodeId,
        before: Option<HostNodeId>,
    ) -> Result<(), HostError>;

    /// Detach a node from its parent
    fn remove(&mut self, node: HostNodeId) -> Result<(), HostError>;
}

/// Kind of an in-memory host node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNodeKind {
    Element(String),
    Text,
    Comment,
    Fragment,
}

/// In-memory host node
#[derive(Debug, Clone)]
pub struct HostNode {
    pub kind: HostNodeKind,
    pub attributes: IndexMap<String, String>,
    pub listeners: Vec<Listener>,
    pub text: String,
    pub children: Vec<HostNodeId>,
    pub parent: Option<HostNodeId>,
}

impl HostNode {
    fn new(kind: HostNodeKind) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
            listeners: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    fn is_container(&self) -> bool {
        matches!(self.kind, HostNodeKind::Element(_) | HostNodeKind::Fragment)
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            HostNodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }
}

/// One recorded host call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMutation {
    Create { node: HostNodeId },
    SetAttribute { node: HostNodeId, name: String, value: String },
    RemoveAttribute { node: HostNodeId, name: String },
    AddListener { node: HostNodeId, event_type: String },
    RemoveListener { node: HostNodeId, event_type: String },
    SetText { node: HostNodeId, text: String },
    Insert { parent: HostNodeId, child: HostNodeId, before: Option<HostNodeId> },
    Remove { node: HostNodeId },
}

impl HostMutation {
    /// Whether this call changed an attached tree (creation does not)
    pub fn is_structural_change(&self) -> bool {
        !matches!(self, HostMutation::Create { .. })
    }
}

/// In-memory host tree
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    log: Vec<HostMutation>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, node: HostNodeId) -> Option<&HostNode> {
        self.nodes.get(node.0 as usize)
    }

    fn node_mut(&mut self, node: HostNodeId) -> Result<&mut HostNode, HostError> {
        self.nodes.get_mut(node.0 as usize).ok_or(HostError::UnknownNode(node))
    }

    fn create(&mut self, node: HostNode) -> HostNodeId {
        let id = HostNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.log.push(HostMutation::Create { node: id });
        id
    }

    pub fn children(&self, node: HostNodeId) -> &[HostNodeId] {
        self.get(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, node: HostNodeId) -> Option<HostNodeId> {
        self.get(node).and_then(|n| n.parent)
    }

    pub fn attribute(&self, node: HostNodeId, name: &str) -> Option<&str> {
        self.get(node)?.attributes.get(name).map(String::as_str)
    }

    pub fn text(&self, node: HostNodeId) -> Option<&str> {
        let n = self.get(node)?;
        matches!(n.kind, HostNodeKind::Text | HostNodeKind::Comment).then_some(n.text.as_str())
    }

    /// Every host call made so far
    pub fn mutations(&self) -> &[HostMutation] {
        &self.log
    }

    pub fn take_mutations(&mut self) -> Vec<HostMutation> {
        std::mem::take(&mut self.log)
    }

    fn is_ancestor(&self, ancestor: HostNodeId, node: HostNodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn detach(&mut self, node: HostNodeId) -> Result<(), HostError> {
        if let Some(parent) = self.node_mut(node)?.parent.take() {
            self.node_mut(parent)?.children.retain(|&c| c != node);
        }
        Ok(())
    }

    /// Fire an event at a node; returns how many listeners ran
    pub fn dispatch(&mut self, node: HostNodeId, event: &Event) -> Result<usize, HostError> {
        let listeners: Vec<Listener> = self
            .node_mut(node)?
            .listeners
            .iter()
            .filter(|l| l.event_type == event.event_type)
            .cloned()
            .collect();

        for listener in &listeners {
            listener.callback.call(event);
            if listener.options.once {
                let id = listener.callback.id();
                self.node_mut(node)?
                    .listeners
                    .retain(|l| !(l.event_type == event.event_type && l.callback.id() == id));
            }
        }
        Ok(listeners.len())
    }

    /// Serialize a host subtree
    pub fn to_markup(&self, node: HostNodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: HostNodeId, out: &mut String) {
        let Some(n) = self.get(node) else {
            return;
        };
        match &n.kind {
            HostNodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &n.attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&value.replace('"', "&quot;"));
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(tag) {
                    return;
                }
                for &child in &n.children {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            HostNodeKind::Text => out.push_str(&n.text),
            HostNodeKind::Comment => {
                out.push_str("<!--");
                out.push_str(&n.text);
                out.push_str("-->");
            }
            HostNodeKind::Fragment => {
                for &child in &n.children {
                    self.write_markup(child, out);
                }
            }
        }
    }
}

impl HostTree for MemoryHost {
    fn create_element(&mut self, tag: &str) -> HostNodeId {
        self.create(HostNode::new(HostNodeKind::Element(tag.to_string())))
    }

    fn create_text(&mut self, text: &str) -> HostNodeId {
        let mut node = HostNode::new(HostNodeKind::Text);
        node.text = text.to_string();
        self.create(node)
    }

    fn create_comment(&mut self, text: &str) -> HostNodeId {
        let mut node = HostNode::new(HostNodeKind::Comment);
        node.text = text.to_string();
        self.create(node)
    }

    fn create_fragment(&mut self) -> HostNodeId {
        self.create(HostNode::new(HostNodeKind::Fragment))
    }

    fn set_attribute(&mut self, node: HostNodeId, name: &str, value: &str) -> Result<(), HostError> {
        let n = self.node_mut(node)?;
        if !matches!(n.kind, HostNodeKind::Element(_)) {
            return Err(HostError::Unsupported(node, "attributes"));
        }
        n.attributes.insert(name.to_string(), value.to_string());
        self.log.push(HostMutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: HostNodeId, name: &str) -> Result<(), HostError> {
        self.node_mut(node)?.attributes.shift_remove(name);
        self.log.push(HostMutation::RemoveAttribute { node, name: name.to_string() });
        Ok(())
    }

    fn add_listener(&mut self, node: HostNodeId, listener: &Listener) -> Result<(), HostError> {
        let n = self.node_mut(node)?;
        if !matches!(n.kind, HostNodeKind::Element(_)) {
            return Err(HostError::Unsupported(node, "listeners"));
        }
        let (event_type, id) = listener.key();
        match n
            .listeners
            .iter_mut()
            .find(|l| l.event_type == event_type && l.callback.id() == id)
        {
            Some(existing) => *existing = listener.clone(),
            None => n.listeners.push(listener.clone()),
        }
        self.log.push(HostMutation::AddListener {
            node,
            event_type: listener.event_type.clone(),
        });
        Ok(())
    }

    fn remove_listener(&mut self, node: HostNodeId, event_type: &str, id: CallbackId) -> Result<(), HostError> {
        self.node_mut(node)?
            .listeners
            .retain(|l| !(l.event_type == event_type && l.callback.id() == id));
        self.log.push(HostMutation::RemoveListener {
            node,
            event_type: event_type.to_string(),
        });
        Ok(())
    }

    fn set_text(&mut self, node: HostNodeId, text: &str) -> Result<(), HostError> {
        let n = self.node_mut(node)?;
        if !matches!(n.kind, HostNodeKind::Text | HostNodeKind::Comment) {
            return Err(HostError::Unsupported(node, "text"));
        }
        n.text = text.to_string();
        self.log.push(HostMutation::SetText { node, text: text.to_string() });
        Ok(())
    }

    fn insert_before(
        &mut self,
        parent: HostNodeId,
        child: HostNodeId,
        before: Option<HostNodeId>,
    ) -> Result<(), HostError> {
        if !self.node_mut(parent)?.is_container() {
            return Err(HostError::NotAContainer(parent));
        }
        self.node_mut(child)?;
        if self.is_ancestor(child, parent) {
            return Err(HostError::Cycle { node: child, parent });
        }
        if let Some(reference) = before {
            if reference == child || self.parent(reference) != Some(parent) {
                return Err(HostError::NotAChild { parent, reference });
            }
        }

        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = before
            .and_then(|r| siblings.iter().position(|&c| c == r))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);

        self.log.push(HostMutation::Insert { parent, child, before });
        Ok(())
    }

    fn remove(&mut self, node: HostNodeId) -> Result<(), HostError> {
        self.detach(node)?;
        self.log.push(HostMutation::Remove { node });
        Ok(())
    }
}
