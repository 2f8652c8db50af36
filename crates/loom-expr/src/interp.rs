//! Tree-walking evaluator
//!
//! Evaluates parsed expressions against a [`Scope`]: a chain of local
//! bindings (loop variables) in front of a context object.

use super::ast::{BinaryOp, Expr, ExprKind, Literal, LogicalOp, UnaryOp};
use super::error::{EvalError, EvalResult};
use super::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

/// One local binding, linked to the enclosing ones
#[derive(Debug)]
struct Frame {
    name: Box<str>,
    value: Value,
    parent: Option<Rc<Frame>>,
}

/// Name resolution environment
///
/// Cloning is cheap; extending a scope never affects the scope it was
/// derived from.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    context: Value,
    frame: Option<Rc<Frame>>,
}

impl Scope {
    /// Root scope for a context object
    pub fn new(context: Value) -> Self {
        Self { context, frame: None }
    }

    /// The value `this` refers to
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Derive a scope with one additional binding
    pub fn with_binding(&self, name: &str, value: Value) -> Self {
        Self {
            context: self.context.clone(),
            frame: Some(Rc::new(Frame {
                name: name.into(),
                value,
                parent: self.frame.clone(),
            })),
        }
    }

    /// Look up a name: local bindings first, then the context's own keys
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut frame = self.frame.as_deref();
        while let Some(f) = frame {
            if &*f.name == name {
                return Some(f.value.clone());
            }
            frame = f.parent.as_deref();
        }

        self.context.as_object().and_then(|map| map.get(name).cloned())
    }

    pub fn resolve(&self, name: &str) -> EvalResult<Value> {
        self.lookup(name)
            .ok_or_else(|| EvalError::Reference(name.to_string()))
    }
}

/// Evaluate an expression in a scope
pub fn evaluate(expr: &Expr, scope: &Scope) -> EvalResult<Value> {
    match &expr.kind {
        ExprKind::Literal(lit) => Ok(match lit {
            Literal::Undefined => Value::Undefined,
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(Rc::from(&**s)),
        }),

        ExprKind::Identifier(name) => scope.resolve(name),

        ExprKind::This => Ok(scope.context().clone()),

        ExprKind::Array(elements) => {
            let items = elements
                .iter()
                .map(|e| evaluate(e, scope))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::from(items))
        }

        ExprKind::Object(entries) => {
            let mut pairs = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                pairs.push((key.to_string(), evaluate(value, scope)?));
            }
            Ok(Value::object(pairs))
        }

        ExprKind::Member { object, property, optional } => {
            let target = evaluate(object, scope)?;
            if *optional && target.is_nullish() {
                return Ok(Value::Undefined);
            }
            target.get_property(property)
        }

        ExprKind::Index { object, index } => {
            let target = evaluate(object, scope)?;
            let key = evaluate(index, scope)?;
            target.get_index(&key)
        }

        ExprKind::Call { callee, arguments } => {
            let target = evaluate(callee, scope)?;
            let Value::Function(func) = target else {
                return Err(EvalError::NotCallable(describe(callee)));
            };
            let args = arguments
                .iter()
                .map(|a| evaluate(a, scope))
                .collect::<EvalResult<Vec<_>>>()?;
            func.call(&args)
        }

        ExprKind::Unary { operator, argument } => eval_unary(*operator, argument, scope),

        ExprKind::Binary { operator, left, right } => {
            let l = evaluate(left, scope)?;
            let r = evaluate(right, scope)?;
            Ok(eval_binary(*operator, &l, &r))
        }

        ExprKind::Logical { operator, left, right } => {
            let l = evaluate(left, scope)?;
            let short_circuit = match operator {
                LogicalOp::And => !l.is_truthy(),
                LogicalOp::Or => l.is_truthy(),
                LogicalOp::NullishCoalescing => !l.is_nullish(),
            };
            if short_circuit { Ok(l) } else { evaluate(right, scope) }
        }

        ExprKind::Conditional { test, consequent, alternate } => {
            if evaluate(test, scope)?.is_truthy() {
                evaluate(consequent, scope)
            } else {
                evaluate(alternate, scope)
            }
        }
    }
}

fn eval_unary(op: UnaryOp, argument: &Expr, scope: &Scope) -> EvalResult<Value> {
    // typeof tolerates undeclared names
    if op == UnaryOp::Typeof {
        if let ExprKind::Identifier(name) = &argument.kind {
            return Ok(Value::string(
                scope.lookup(name).map(|v| v.type_of()).unwrap_or("undefined"),
            ));
        }
    }

    let value = evaluate(argument, scope)?;
    Ok(match op {
        UnaryOp::Not => Value::Bool(!value.is_truthy()),
        UnaryOp::Minus => Value::Number(-value.to_number()),
        UnaryOp::Plus => Value::Number(value.to_number()),
        UnaryOp::Typeof => Value::string(value.type_of()),
    })
}

fn is_stringy(v: &Value) -> bool {
    matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_))
}

fn eval_binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if is_stringy(l) || is_stringy(r) {
                let mut s = l.to_display_string();
                s.push_str(&r.to_display_string());
                Value::from(s)
            } else {
                Value::Number(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Number(l.to_number() / r.to_number()),
        BinaryOp::Mod => Value::Number(l.to_number() % r.to_number()),

        BinaryOp::LessThan => Value::Bool(compare(l, r) == Some(Ordering::Less)),
        BinaryOp::LessThanEq => {
            Value::Bool(matches!(compare(l, r), Some(Ordering::Less | Ordering::Equal)))
        }
        BinaryOp::GreaterThan => Value::Bool(compare(l, r) == Some(Ordering::Greater)),
        BinaryOp::GreaterThanEq => {
            Value::Bool(matches!(compare(l, r), Some(Ordering::Greater | Ordering::Equal)))
        }

        BinaryOp::Equal => Value::Bool(l.loose_equals(r)),
        BinaryOp::NotEqual => Value::Bool(!l.loose_equals(r)),
        BinaryOp::StrictEqual => Value::Bool(l.strict_equals(r)),
        BinaryOp::StrictNotEqual => Value::Bool(!l.strict_equals(r)),
    }
}

/// Relational comparison; `None` when either side is NaN
fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => l.to_number().partial_cmp(&r.to_number()),
    }
}

/// Short source-like name for a callee, used in error messages
fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Identifier(name) => name.to_string(),
        ExprKind::This => "this".to_string(),
        ExprKind::Member { object, property, optional } => {
            format!("{}{}{}", describe(object), if *optional { "?." } else { "." }, property)
        }
        ExprKind::Index { object, .. } => format!("{}[...]", describe(object)),
        ExprKind::Call { callee, .. } => format!("{}(...)", describe(callee)),
        _ => "expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use serde_json::json;

    fn eval(src: &str, context: serde_json::Value) -> EvalResult<Value> {
        let expr = Parser::new(src).parse().unwrap();
        evaluate(&expr, &Scope::new(Value::from(context)))
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 1", json!({})).unwrap(), Value::from(2));
        assert_eq!(eval("2 * 3 + 4", json!({})).unwrap(), Value::from(10));
        assert_eq!(eval("7 % 3", json!({})).unwrap(), Value::from(1));
        assert_eq!(eval("'a' + 1", json!({})).unwrap(), Value::from("a1"));
        assert_eq!(eval("-'3'", json!({})).unwrap(), Value::from(-3));
    }

    #[test]
    fn test_context_names_and_this() {
        let ctx = json!({"count": 2, "user": {"name": "ada"}});
        assert_eq!(eval("count * 2", ctx.clone()).unwrap(), Value::from(4));
        assert_eq!(eval("this.count", ctx.clone()).unwrap(), Value::from(2));
        assert_eq!(eval("user.name", ctx.clone()).unwrap(), Value::from("ada"));
        assert_eq!(eval("user['name'].length", ctx).unwrap(), Value::from(3));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(eval("missing", json!({})), Err(EvalError::Reference("missing".into())));
        assert_eq!(eval("typeof missing", json!({})).unwrap(), Value::from("undefined"));
    }

    #[test]
    fn test_optional_chaining() {
        assert_eq!(eval("a?.b", json!({"a": null})).unwrap(), Value::Undefined);
        assert!(matches!(eval("a.b", json!({"a": null})), Err(EvalError::Type(_))));
    }

    #[test]
    fn test_logical_short_circuit() {
        assert_eq!(eval("0 || 'x'", json!({})).unwrap(), Value::from("x"));
        assert_eq!(eval("0 && missing", json!({})).unwrap(), Value::from(0));
        assert_eq!(eval("0 ?? 5", json!({})).unwrap(), Value::from(0));
        assert_eq!(eval("null ?? 5", json!({})).unwrap(), Value::from(5));
    }

    #[test]
    fn test_comparison_and_conditional() {
        assert_eq!(eval("'b' > 'a' ? 1 : 2", json!({})).unwrap(), Value::from(1));
        assert_eq!(eval("n >= 3", json!({"n": 3})).unwrap(), Value::from(true));
        assert_eq!(eval("1 == '1'", json!({})).unwrap(), Value::from(true));
        assert_eq!(eval("1 === '1'", json!({})).unwrap(), Value::from(false));
    }

    #[test]
    fn test_scope_bindings_shadow_context() {
        let expr = Parser::new("x + y").parse().unwrap();
        let root = Scope::new(Value::from(json!({"x": 1, "y": 10})));
        let inner = root.with_binding("x", Value::from(5));
        assert_eq!(evaluate(&expr, &inner).unwrap(), Value::from(15));
        assert_eq!(evaluate(&expr, &root).unwrap(), Value::from(11));
    }

    #[test]
    fn test_calls() {
        let ctx = Value::object([
            ("double", Value::function("double", |args| {
                Ok(Value::Number(args.first().map(Value::to_number).unwrap_or(f64::NAN) * 2.0))
            })),
            ("fail", Value::function("fail", |_| Err(EvalError::Thrown("boom".into())))),
            ("n", Value::from(4)),
        ]);
        let scope = Scope::new(ctx);
        let run = |src: &str| evaluate(&Parser::new(src).parse().unwrap(), &scope);

        assert_eq!(run("double(n)").unwrap(), Value::from(8));
        assert_eq!(run("fail()"), Err(EvalError::Thrown("boom".into())));
        assert_eq!(run("n()"), Err(EvalError::NotCallable("n".into())));
    }

    #[test]
    fn test_literals() {
        let v = eval("{a: 1, 'b': [true, null]}", json!({})).unwrap();
        assert_eq!(v, Value::from(json!({"a": 1, "b": [true, null]})));
    }
}
