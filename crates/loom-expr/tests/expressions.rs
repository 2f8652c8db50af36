//! Expression language tests
//!
//! Evaluation against realistic template contexts.

use loom_expr::*;
use serde_json::json;

fn context() -> Value {
    Value::from(json!({
        "title": "Inbox",
        "count": 3,
        "items": [{"label": "a", "done": true}, {"label": "b", "done": false}],
        "user": null,
    }))
}

// ============================================================================
// TEMPLATE-STYLE EXPRESSIONS
// ============================================================================

#[test]
fn test_interpolation_style_expressions() {
    let ctx = context();
    assert_eq!(eval("title + ' (' + count + ')'", ctx.clone()).unwrap(), Value::from("Inbox (3)"));
    assert_eq!(eval("this.items.length", ctx.clone()).unwrap(), Value::from(2));
    assert_eq!(eval("items[1].label", ctx).unwrap(), Value::from("b"));
}

#[test]
fn test_condition_style_expressions() {
    let ctx = context();
    assert_eq!(eval("count > 0 && !user", ctx.clone()).unwrap(), Value::from(true));
    assert_eq!(eval("user?.name ?? 'guest'", ctx.clone()).unwrap(), Value::from("guest"));
    assert_eq!(eval("items[0].done ? 'yes' : 'no'", ctx).unwrap(), Value::from("yes"));
}

#[test]
fn test_loop_variable_scope() {
    let expr = Expression::compile("item.label + '-' + title").unwrap();
    let root = Scope::new(context());
    let items = root.context().get_property("items").unwrap().iterate().unwrap();

    let rendered: Vec<String> = items
        .into_iter()
        .map(|item| expr.evaluate(&root.with_binding("item", item)).unwrap().to_display_string())
        .collect();
    assert_eq!(rendered, vec!["a-Inbox", "b-Inbox"]);
}

#[test]
fn test_context_functions() {
    let ctx = Value::object([
        ("greet", Value::function("greet", |args| {
            let name = args.first().map(Value::to_display_string).unwrap_or_default();
            Ok(Value::from(format!("hello {}", name)))
        })),
        ("name", Value::from("loom")),
    ]);
    assert_eq!(eval("greet(name)", ctx).unwrap(), Value::from("hello loom"));
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_syntax_errors_carry_offsets() {
    let err = compile("1 + * 2").unwrap_err();
    assert_eq!(err.span.start, 4);

    assert!(compile("").is_err());
    assert!(compile("a b").is_err());
    assert!(compile("'open").is_err());
    assert!(compile("(1 + 2").is_err());
}

#[test]
fn test_assignment_is_rejected() {
    let err = compile("count = 1").unwrap_err();
    assert!(err.message.contains("assignment"));
}

#[test]
fn test_runtime_errors() {
    let ctx = context();
    assert!(matches!(eval("nope", ctx.clone()), Err(EvalFailure::Eval(EvalError::Reference(_)))));
    assert!(matches!(eval("user.name", ctx.clone()), Err(EvalFailure::Eval(EvalError::Type(_)))));
    assert!(matches!(eval("title()", ctx), Err(EvalFailure::Eval(EvalError::NotCallable(_)))));
}

#[test]
fn test_thrown_errors_are_distinguishable() {
    let ctx = Value::object([("explode", Value::function("explode", |_| {
        Err(EvalError::Thrown("kaboom".into()))
    }))]);
    match eval("explode()", ctx) {
        Err(EvalFailure::Eval(err)) => assert!(err.is_thrown()),
        other => panic!("unexpected {:?}", other),
    }
}
