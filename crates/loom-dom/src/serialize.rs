//! Markup serialization for debugging and tests

use crate::{NodeData, NodeId, VTree};

/// Elements written without a close tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Check if a tag is a void element
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

impl VTree {
    /// Serialize a subtree back to markup
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in el.attributes.iter() {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&value.replace('"', "&quot;"));
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                for &child in node.children() {
                    self.write_markup(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
            NodeData::Text(t) => out.push_str(&t.content),
            NodeData::Comment(c) => {
                out.push_str("<!--");
                out.push_str(&c.content);
                out.push_str("-->");
            }
            NodeData::Fragment(_) => {
                for &child in node.children() {
                    self.write_markup(child, out);
                }
            }
        }
    }
}
