//! Expression Values
//!
//! Dynamic values with JavaScript-flavoured truthiness, stringification and
//! equality. Arrays, objects and functions are reference counted; cloning a
//! value never deep-copies.

use super::error::{EvalError, EvalResult};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Native function signature
type NativeFn = dyn Fn(&[Value]) -> EvalResult<Value>;

/// Function supplied by the context
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new(name: &str, func: impl Fn(&[Value]) -> EvalResult<Value> + 'static) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the underlying function; stable across clones
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.func) as *const () as usize
    }

    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

/// Expression value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Object(Rc<IndexMap<String, Value>>),
    Function(NativeFunction),
}

/// Format a number the way JavaScript's `String(n)` does for common values
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl Value {
    /// Build an object from `(key, value)` pairs, keeping their order
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Rc::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()))
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Rc::new(items.into_iter().collect()))
    }

    pub fn function(name: &str, func: impl Fn(&[Value]) -> EvalResult<Value> + 'static) -> Self {
        Value::Function(NativeFunction::new(name, func))
    }

    pub fn string(s: &str) -> Self {
        Value::String(s.into())
    }

    /// `typeof` result
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b { 1.0 } else { 0.0 }
            }
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(_) => Value::String(self.to_display_string().into()).to_number(),
            Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// String conversion used by interpolation and attribute binding
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Array(items) => items
                .iter()
                .map(|v| if v.is_nullish() { String::new() } else { v.to_display_string() })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&NativeFunction> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Elements produced by iterating this value, if it is iterable
    pub fn iterate(&self) -> Option<Vec<Value>> {
        match self {
            Value::Array(items) => Some(items.as_ref().clone()),
            Value::String(s) => Some(s.chars().map(|c| Value::String(c.to_string().into())).collect()),
            _ => None,
        }
    }

    /// Property lookup (`value.name`)
    pub fn get_property(&self, name: &str) -> EvalResult<Value> {
        match self {
            Value::Undefined | Value::Null => Err(EvalError::Type(format!(
                "cannot read properties of {} (reading '{}')",
                self.to_display_string(),
                name
            ))),
            Value::Object(map) => Ok(map.get(name).cloned().unwrap_or_default()),
            Value::Array(items) => Ok(match name {
                "length" => Value::Number(items.len() as f64),
                _ => name
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or_default(),
            }),
            Value::String(s) => Ok(match name {
                "length" => Value::Number(s.chars().count() as f64),
                _ => name
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::String(c.to_string().into()))
                    .unwrap_or_default(),
            }),
            Value::Function(f) => Ok(match name {
                "name" => Value::String(f.name().into()),
                _ => Value::Undefined,
            }),
            Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
        }
    }

    /// Computed lookup (`value[key]`)
    pub fn get_index(&self, key: &Value) -> EvalResult<Value> {
        let name = match key {
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => format!("{:.0}", n),
            other => other.to_display_string(),
        };
        self.get_property(&name)
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }

    /// `==`, with the common coercions
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => {
                if matches!(self, Value::Array(_) | Value::Object(_))
                    || matches!(other, Value::Array(_) | Value::Object(_))
                {
                    self.to_display_string() == other.to_display_string()
                } else {
                    self.to_number() == other.to_number()
                }
            }
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Function(func) => write!(f, "{:?}", func),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Structural equality (functions compare by identity)
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self.strict_equals(other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }
}

impl From<NativeFunction> for Value {
    fn from(f: NativeFunction) -> Self {
        Value::Function(f)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(1e20), "100000000000000000000");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::array([]).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_display() {
        let v = Value::from(json!([1, null, "a", [2, 3]]));
        assert_eq!(v.to_display_string(), "1,,a,2,3");
        assert_eq!(Value::from(json!({"a": 1})).to_display_string(), "[object Object]");
        assert_eq!(Value::Undefined.to_display_string(), "undefined");
    }

    #[test]
    fn test_property_access() {
        let v = Value::from(json!({"items": [10, 20], "name": "loom"}));
        let items = v.get_property("items").unwrap();
        assert_eq!(items.get_property("length").unwrap(), Value::from(2));
        assert_eq!(items.get_index(&Value::from(1)).unwrap(), Value::from(20));
        assert_eq!(v.get_property("missing").unwrap(), Value::Undefined);
        assert_eq!(v.get_property("name").unwrap().get_property("length").unwrap(), Value::from(4));
        assert!(matches!(Value::Null.get_property("x"), Err(EvalError::Type(_))));
    }

    #[test]
    fn test_equality() {
        assert!(Value::from(1).loose_equals(&Value::from("1")));
        assert!(!Value::from(1).strict_equals(&Value::from("1")));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        assert!(Value::from(true).loose_equals(&Value::from(1)));

        let arr = Value::array([Value::from(1)]);
        assert!(arr.strict_equals(&arr.clone()));
        assert!(!arr.strict_equals(&Value::array([Value::from(1)])));
    }

    #[test]
    fn test_function_identity() {
        let f = Value::function("f", |_| Ok(Value::Null));
        let g = Value::function("f", |_| Ok(Value::Null));
        assert!(f.strict_equals(&f.clone()));
        assert!(!f.strict_equals(&g));
        assert_eq!(
            f.as_function().unwrap().id(),
            f.clone().as_function().unwrap().id()
        );
    }

    #[test]
    fn test_iterate() {
        assert_eq!(Value::from("ab").iterate().unwrap().len(), 2);
        assert!(Value::from(3).iterate().is_none());
        assert!(Value::from(json!({})).iterate().is_none());
    }
}
