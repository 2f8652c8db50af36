//! Template engine tests
//!
//! Full templates rendered against changing contexts.

use loom_dom::{CallbackId, Event, VNode};
use loom_engine::{DiagnosticKind, TemplateEngine};
use loom_expr::Value;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

fn engine(src: &str) -> TemplateEngine {
    TemplateEngine::new(Rc::new(loom_html::parse(src).unwrap()))
}

fn text_at(engine: &TemplateEngine, path: &str) -> Option<String> {
    let tree = engine.render()?;
    let id = tree.find(path)?;
    Some(tree.tree().text_content(id))
}

#[test]
fn test_repeat_over_items() {
    let mut engine = engine(r#"<span *for="let i of this.items">{{i}}</span>"#);
    engine.set_context(Value::from(json!({"items": [1, 2, 3]}))).unwrap();

    let tree = engine.render().unwrap();
    assert_eq!(tree.to_markup(), "<span>1</span><span>2</span><span>3</span>");
    assert_eq!(text_at(&engine, "root/element:0").as_deref(), Some("1"));
    assert_eq!(text_at(&engine, "root/element:2").as_deref(), Some("3"));

    engine.set_context(Value::from(json!({"items": [3, 2, 1]}))).unwrap();
    assert_eq!(text_at(&engine, "root/element:0").as_deref(), Some("3"));
    assert_eq!(text_at(&engine, "root/element:2").as_deref(), Some("1"));
}

#[test]
fn test_repeat_over_string() {
    let mut engine = engine(r#"<b *for="let c of word">{{c}}</b>"#);
    engine.set_context(Value::from(json!({"word": "hey"}))).unwrap();
    assert_eq!(engine.render().unwrap().to_markup(), "<b>h</b><b>e</b><b>y</b>");
}

#[test]
fn test_if_inside_repeat_uses_item_scope() {
    let mut engine = engine(
        r#"<ul><li *for="let t of todos" *if="!t.done" [data-id]="t.id">{{ t.title }}</li></ul>"#,
    );
    engine
        .set_context(Value::from(json!({"todos": [
            {"id": 1, "title": "a", "done": false},
            {"id": 2, "title": "b", "done": true},
            {"id": 3, "title": "c", "done": false},
        ]})))
        .unwrap();
    assert_eq!(
        engine.render().unwrap().to_markup(),
        "<ul><li data-id=\"1\">a</li><li data-id=\"3\">c</li></ul>"
    );
}

#[test]
fn test_nested_repeat() {
    let mut engine = engine(
        r#"<div *for="let row of rows"><i *for="let cell of row">{{ cell }}</i></div>"#,
    );
    engine.set_context(Value::from(json!({"rows": [[1, 2], [3]]}))).unwrap();
    assert_eq!(
        engine.render().unwrap().to_markup(),
        "<div><i>1</i><i>2</i></div><div><i>3</i></div>"
    );
    assert_eq!(text_at(&engine, "root/element:1/element:0").as_deref(), Some("3"));
}

#[test]
fn test_invalid_repeat_is_diagnosed() {
    let mut engine = engine(r#"<p *for="item in items"></p><p>after</p>"#);
    engine.set_context(Value::from(json!({"items": []}))).unwrap();
    assert_eq!(engine.render().unwrap().to_markup(), "<p>after</p>");
    assert_eq!(engine.diagnostics()[0].kind, DiagnosticKind::InvalidRepeat);
}

fn render_skipping(src: &str) -> TemplateEngine {
    let mut engine = engine(src);
    engine.set_context(Value::from(json!({}))).unwrap();
    engine
}

#[test]
fn test_broken_condition_skips_element() {
    let engine = render_skipping(r#"<p *if="missing.x">a</p><p>b</p>"#);
    assert_eq!(engine.render().unwrap().to_markup(), "<p>b</p>");
    assert_eq!(engine.diagnostics().len(), 1);
    assert_eq!(engine.diagnostics()[0].kind, DiagnosticKind::Evaluation);
    assert_eq!(engine.diagnostics()[0].path, "root/element:0");
    assert_eq!(text_at(&engine, "root/element:0").as_deref(), Some("b"));
}

#[test]
fn test_broken_bound_attribute_skips_element() {
    let engine = render_skipping(r#"<p [title]="missing.x">a</p><p>b</p>"#);
    assert_eq!(engine.render().unwrap().to_markup(), "<p>b</p>");
    assert_eq!(engine.diagnostics().len(), 1);
    assert_eq!(engine.diagnostics()[0].kind, DiagnosticKind::Evaluation);
    assert_eq!(engine.diagnostics()[0].path, "root/element:0");
    assert_eq!(engine.diagnostics()[0].source, "missing.x");
}

#[test]
fn test_condition_syntax_error_skips_element() {
    let engine = render_skipping(r#"<p *if="1 +">a</p><p>b</p>"#);
    assert_eq!(engine.render().unwrap().to_markup(), "<p>b</p>");
    assert_eq!(engine.diagnostics().len(), 1);
    assert_eq!(engine.diagnostics()[0].kind, DiagnosticKind::Syntax);
    assert_eq!(engine.diagnostics()[0].path, "root/element:0");
}

#[test]
fn test_diagnostics_reset_each_render() {
    let mut engine = engine("<p>{{ name.first }}</p>");
    engine.set_context(Value::from(json!({"name": null}))).unwrap();
    assert_eq!(engine.diagnostics().len(), 1);

    engine.set_context(Value::from(json!({"name": {"first": "Ada"}}))).unwrap();
    assert!(engine.diagnostics().is_empty());
    assert_eq!(engine.render().unwrap().to_markup(), "<p>Ada</p>");
}

#[test]
fn test_event_binding_keeps_function_identity() {
    let clicks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&clicks);
    let on_click = Value::function("onClick", move |_| {
        counter.set(counter.get() + 1);
        Ok(Value::Undefined)
    });
    let id = CallbackId(on_click.as_function().unwrap().id());

    let mut engine = engine(r#"<button (click)="onClick">go</button>"#);
    engine.set_context(Value::object([("onClick", on_click.clone())])).unwrap();

    let tree = engine.render().unwrap();
    let button = tree.find("root/element:0").unwrap();
    let events = tree.tree().get(button).and_then(VNode::events).unwrap();
    let listener = events.get("click", id).unwrap();
    listener.callback.call(&Event::new("click"));
    assert_eq!(clicks.get(), 1);

    // Same function on the next render: same identity
    engine.set_context(Value::object([("onClick", on_click)])).unwrap();
    let tree = engine.render().unwrap();
    let button = tree.find("root/element:0").unwrap();
    assert!(tree.tree().get(button).and_then(VNode::events).unwrap().get("click", id).is_some());
}

#[test]
fn test_event_binding_to_non_function() {
    let mut engine = engine(r#"<button (click)="label">{{ label }}</button>"#);
    engine.set_context(Value::from(json!({"label": "go"}))).unwrap();
    assert_eq!(engine.render().unwrap().to_markup(), "<button>go</button>");
    assert_eq!(engine.diagnostics()[0].kind, DiagnosticKind::NotAFunction);
}

#[test]
fn test_custom_root_key() {
    let template = Rc::new(loom_html::parse("<p></p>").unwrap());
    let mut engine = TemplateEngine::with_root_key(template, "app");
    engine.set_context(Value::from(json!({}))).unwrap();
    assert!(engine.render().unwrap().find("app/element:0").is_some());
}
