//! The dynamically-typed runtime value every matcher expression operates on.

use std::collections::BTreeMap;
use std::fmt;

/// A request field, policy field, or intermediate expression result.
///
/// Mirrors the tagged variant named in the design notes: `Nil | Bool | Int
/// | Float | Str | Bag`. `Nil` is the sentinel returned for a missing
/// attribute-bag key — it compares unequal to anything except another
/// `Nil` and is falsy in boolean context.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bag(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bag(_) => true,
        }
    }

    /// Dotted-field access into a `Bag`, returning `Nil` for anything else
    /// (including a missing key) rather than erroring.
    pub fn get_field(&self, field: &str) -> Value {
        match self {
            Value::Bag(map) => map.get(field).cloned().unwrap_or(Value::Nil),
            _ => Value::Nil,
        }
    }

    /// String rendering used for string-vs-string comparisons and for
    /// joining a request tuple into a cache key.
    pub fn as_display_string(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
            Value::Bag(_) => String::new(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// `==` per the spec: numeric-vs-numeric coerces, otherwise lexical
    /// string comparison; unlike types (other than two numbers) compare
    /// false rather than erroring. `Nil == Nil` is the sole exception that
    /// makes the sentinel comparable to itself.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, _) | (_, Value::Nil) => false,
            (a, b) if a.is_number() && b.is_number() => a.as_f64() == b.as_f64(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => self.as_display_string() == other.as_display_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(_) => Value::Str(v.to_string()),
            serde_json::Value::Object(map) => {
                Value::Bag(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_compares_unequal_to_everything_but_nil() {
        assert!(Value::Nil.loose_eq(&Value::Nil));
        assert!(!Value::Nil.loose_eq(&Value::Str("".into())));
        assert!(!Value::Int(0).loose_eq(&Value::Nil));
    }

    #[test]
    fn numeric_coercion() {
        assert!(Value::Int(3).loose_eq(&Value::Float(3.0)));
        assert!(!Value::Int(3).loose_eq(&Value::Float(3.1)));
    }

    #[test]
    fn missing_bag_field_is_nil_and_falsy() {
        let bag = Value::Bag(BTreeMap::new());
        let v = bag.get_field("Owner");
        assert!(matches!(v, Value::Nil));
        assert!(!v.is_truthy());
    }
}
