//! Structural invariant tests for loom-dom
//!
//! Single-parent rule, cycle rejection and clone independence.

use loom_dom::{
    AttributeNode, Callback, DomError, ListenerOptions, NodeData, NodeKind, ParentNode, VTree,
};

#[test]
fn test_every_child_points_back_to_its_parent() {
    let mut tree = VTree::new();
    let root = tree.create_fragment();
    let list = tree.create_element("ul");
    tree.append_child(root, list).unwrap();

    for i in 0..5 {
        let li = tree.create_element("li");
        let text = tree.create_text(&i.to_string());
        tree.append_child(li, text).unwrap();
        tree.append_child(list, li).unwrap();
    }

    for id in tree.descendants(root) {
        for &child in tree.children(id) {
            assert_eq!(tree.parent(child), Some(id));
        }
    }
    assert_eq!(tree.text_content(root), "01234");
}

#[test]
fn test_moving_requires_detach() {
    let mut tree = VTree::new();
    let a = tree.create_element("div");
    let b = tree.create_element("div");
    let child = tree.create_text("x");
    tree.append_child(a, child).unwrap();

    assert!(matches!(
        tree.append_child(b, child),
        Err(DomError::HierarchyRequest { parent, .. }) if parent == a
    ));

    tree.detach(child).unwrap();
    tree.append_child(b, child).unwrap();
    assert!(tree.children(a).is_empty());
    assert_eq!(tree.children(b), &[child]);
}

#[test]
fn test_deep_ancestor_cycle_rejected() {
    let mut tree = VTree::new();
    let a = tree.create_element("a");
    let b = tree.create_element("b");
    let c = tree.create_element("c");
    tree.append_child(a, b).unwrap();
    tree.append_child(b, c).unwrap();

    let err = tree.append_child(c, a).unwrap_err();
    assert_eq!(err, DomError::Cycle { node: a, destination: c });
    assert_eq!(tree.parent(a), None);
}

#[test]
fn test_deep_clone_is_independent() {
    let mut tree = VTree::new();
    let div = tree.create_element("div");
    let text = tree.create_text("before");
    tree.append_child(div, text).unwrap();
    tree.get_mut(div)
        .unwrap()
        .events_mut()
        .unwrap()
        .add("click", Callback::new(|_| {}), ListenerOptions::default());

    let copy = tree.clone_node(div, true).unwrap();
    let copied_text = tree.children(copy)[0];
    tree.get_mut(copied_text).unwrap().set_text_content("after");

    assert_eq!(tree.text_content(div), "before");
    assert_eq!(tree.text_content(copy), "after");
    assert_eq!(tree.get(copy).unwrap().events().unwrap().len(), 1);
}

#[test]
fn test_capability_traits_on_variants() {
    let mut tree = VTree::new();
    let div = tree.create_element("div");
    let span = tree.create_element("span");
    tree.append_child(div, span).unwrap();

    let node = tree.get_mut(div).unwrap();
    assert_eq!(node.kind(), NodeKind::Element);
    if let NodeData::Element(el) = &mut node.data {
        el.attributes_mut().set("role", "list");
        assert_eq!(el.children(), &[span]);
        assert_eq!(el.attributes().get("role"), Some("list"));
    } else {
        panic!("expected element");
    }
}
