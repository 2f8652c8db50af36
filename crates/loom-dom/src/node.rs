//! Virtual Node - Tagged variants with capabilities
//!
//! Each variant implements only the capability traits that make sense for
//! it. Probes on [`VNode`] are fixed per variant, so callers can branch on
//! capability without caring which kind they hold.

use crate::{AttributeBag, EventRegistrations, NodeId};

/// Kind of a virtual node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Fragment,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
            NodeKind::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nodes carrying an attribute bag
pub trait AttributeNode {
    fn attributes(&self) -> &AttributeBag;
    fn attributes_mut(&mut self) -> &mut AttributeBag;
}

/// Nodes accepting event listeners
pub trait EventNode {
    fn events(&self) -> &EventRegistrations;
    fn events_mut(&mut self) -> &mut EventRegistrations;
}

/// Nodes owning an ordered child list
pub trait ParentNode {
    fn children(&self) -> &[NodeId];
    fn children_mut(&mut self) -> &mut Vec<NodeId>;
}

/// Nodes with character content
pub trait TextNode {
    fn text(&self) -> &str;
    fn set_text(&mut self, text: String);
}

/// Element data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: AttributeBag,
    pub events: EventRegistrations,
    children: Vec<NodeId>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: AttributeBag::new(),
            events: EventRegistrations::new(),
            children: Vec::new(),
        }
    }
}

impl AttributeNode for Element {
    fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut AttributeBag {
        &mut self.attributes
    }
}

impl EventNode for Element {
    fn events(&self) -> &EventRegistrations {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventRegistrations {
        &mut self.events
    }
}

impl ParentNode for Element {
    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }
}

/// Text data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub content: String,
}

impl TextNode for Text {
    fn text(&self) -> &str {
        &self.content
    }

    fn set_text(&mut self, text: String) {
        self.content = text;
    }
}

/// Comment data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub content: String,
}

impl TextNode for Comment {
    fn text(&self) -> &str {
        &self.content
    }

    fn set_text(&mut self, text: String) {
        self.content = text;
    }
}

/// Fragment - parentless container of top-level nodes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    children: Vec<NodeId>,
}

impl ParentNode for Fragment {
    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }
}

/// Node-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(Text),
    Comment(Comment),
    Fragment(Fragment),
}

/// Virtual node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VNode {
    pub(crate) parent: Option<NodeId>,
    /// Structural path assigned by the template engine
    pub path: Option<String>,
    pub data: NodeData,
}

impl VNode {
    pub fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            path: None,
            data,
        }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(NodeData::Element(Element::new(tag)))
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeData::Text(Text {
            content: content.into(),
        }))
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Self::new(NodeData::Comment(Comment {
            content: content.into(),
        }))
    }

    pub fn fragment() -> Self {
        Self::new(NodeData::Fragment(Fragment::default()))
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::Fragment(_) => NodeKind::Fragment,
        }
    }

    /// Parent node, if attached
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn is_attribute_node(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_event_node(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_parent_node(&self) -> bool {
        matches!(self.data, NodeData::Element(_) | NodeData::Fragment(_))
    }

    /// Whether this node may be attached under a parent
    #[inline]
    pub fn is_child_node(&self) -> bool {
        !matches!(self.data, NodeData::Fragment(_))
    }

    #[inline]
    pub fn is_text_node(&self) -> bool {
        matches!(self.data, NodeData::Text(_) | NodeData::Comment(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Tag name of an element
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag.as_str())
    }

    pub fn attributes(&self) -> Option<&AttributeBag> {
        match &self.data {
            NodeData::Element(e) => Some(e.attributes()),
            _ => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut AttributeBag> {
        match &mut self.data {
            NodeData::Element(e) => Some(e.attributes_mut()),
            _ => None,
        }
    }

    pub fn events(&self) -> Option<&EventRegistrations> {
        match &self.data {
            NodeData::Element(e) => Some(e.events()),
            _ => None,
        }
    }

    pub fn events_mut(&mut self) -> Option<&mut EventRegistrations> {
        match &mut self.data {
            NodeData::Element(e) => Some(e.events_mut()),
            _ => None,
        }
    }

    /// Child ids; empty for nodes that cannot have children
    pub fn children(&self) -> &[NodeId] {
        match &self.data {
            NodeData::Element(e) => e.children(),
            NodeData::Fragment(f) => f.children(),
            _ => &[],
        }
    }

    pub(crate) fn child_list_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.data {
            NodeData::Element(e) => Some(e.children_mut()),
            NodeData::Fragment(f) => Some(f.children_mut()),
            _ => None,
        }
    }

    /// Character content of text and comment nodes
    pub fn text_content(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t.text()),
            NodeData::Comment(c) => Some(c.text()),
            _ => None,
        }
    }

    pub fn set_text_content(&mut self, text: impl Into<String>) -> bool {
        match &mut self.data {
            NodeData::Text(t) => t.set_text(text.into()),
            NodeData::Comment(c) => c.set_text(text.into()),
            _ => return false,
        }
        true
    }

    /// Self-state copy: parentless, childless, no path
    pub fn shallow_clone(&self) -> VNode {
        let mut data = self.data.clone();
        if let NodeData::Element(e) = &mut data {
            e.children.clear();
        }
        if let NodeData::Fragment(f) = &mut data {
            f.children.clear();
        }
        VNode {
            parent: None,
            path: None,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_per_kind() {
        let el = VNode::element("div");
        assert!(el.is_attribute_node() && el.is_event_node());
        assert!(el.is_parent_node() && el.is_child_node());
        assert!(!el.is_text_node());

        let text = VNode::text("hi");
        assert!(text.is_text_node() && text.is_child_node());
        assert!(!text.is_parent_node() && !text.is_attribute_node());

        let comment = VNode::comment("note");
        assert!(comment.is_text_node());
        assert_eq!(comment.text_content(), Some("note"));

        let frag = VNode::fragment();
        assert!(frag.is_parent_node());
        assert!(!frag.is_child_node());
        assert!(frag.attributes().is_none());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(VNode::element("p").kind().as_str(), "element");
        assert_eq!(VNode::text("").kind().to_string(), "text");
        assert_eq!(NodeKind::Fragment.as_str(), "fragment");
    }

    #[test]
    fn test_set_text_only_on_text_nodes() {
        let mut text = VNode::text("a");
        assert!(text.set_text_content("b"));
        assert_eq!(text.text_content(), Some("b"));

        let mut el = VNode::element("div");
        assert!(!el.set_text_content("b"));
    }
}
