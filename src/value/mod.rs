//! Value model shared by the container, the pipe language and the output layer
//!
//! Every value is one of a small set of scalars or a nested ordered map.
//! Sequences are maps whose keys are exactly `0..n`; see [`Value::is_list`].

mod json;
mod key;
pub mod legacy;

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;

pub(crate) use json::serialize_map;
pub use key::Key;

/// Ordered mapping used at every nesting level.
pub type Map = IndexMap<Key, Value>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Map(Map),
}

impl Value {
    /// Build a sequence value from an iterator of values.
    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Map(list_map(items))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Map(_) => "map",
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// True for a map keyed exactly `0..n` in order.
    pub fn is_list(&self) -> bool {
        self.as_map().map(is_list).unwrap_or(false)
    }

    /// Loose truthiness: null, false, 0, 0.0, "", "0" and the empty map are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !(s.is_empty() || s == "0"),
            Value::Map(m) => !m.is_empty(),
        }
    }

    /// Total order used by `sort`: null, bools, numbers, strings, maps.
    /// Numbers compare by magnitude across ints and floats; maps by length.
    pub fn compare(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) | Value::Float(_) => 2,
                Value::Str(_) => 3,
                Value::Map(_) => 4,
            }
        }

        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.len().cmp(&b.len()),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

/// True when `map` is keyed exactly `0..n` in insertion order.
pub fn is_list(map: &Map) -> bool {
    map.keys()
        .enumerate()
        .all(|(i, k)| k.as_int() == Some(i as i64))
}

/// Collect values under dense integer keys.
pub fn list_map<I: IntoIterator<Item = Value>>(items: I) -> Map {
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| (Key::from(i), v))
        .collect()
}

/// The key `push` would use: one past the largest non-negative integer key.
/// `None` once `i64::MAX` is taken.
pub fn next_index(map: &Map) -> Option<i64> {
    match map.keys().filter_map(Key::as_int).filter(|n| *n >= 0).max() {
        Some(n) => n.checked_add(1),
        None => Some(0),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => write!(f, "1"),
            Value::Bool(false) => Ok(()),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Map(_) => {
                let encoded = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                write!(f, "{}", encoded)
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
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

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<&Key> for Value {
    fn from(k: &Key) -> Self {
        k.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from("0").is_truthy());
        assert!(!Value::Map(Map::new()).is_truthy());

        assert!(Value::Int(-1).is_truthy());
        assert!(Value::from("0.0").is_truthy());
        assert!(Value::from(json!([0])).is_truthy());
    }

    #[test]
    fn test_is_list() {
        assert!(Value::from(json!(["a", "b"])).is_list());
        assert!(Value::Map(Map::new()).is_list());
        assert!(!Value::from(json!({"1": "a"})).is_list());
        assert!(!Value::from(json!({"a": 1})).is_list());
        assert!(!Value::Int(0).is_list());
    }

    #[test]
    fn test_next_index() {
        let map: Map = [(Key::from(3), Value::Null), (Key::from("x"), Value::Null)]
            .into_iter()
            .collect();
        assert_eq!(next_index(&map), Some(4));
        assert_eq!(next_index(&Map::new()), Some(0));

        let negative: Map = [(Key::from(-5), Value::Null)].into_iter().collect();
        assert_eq!(next_index(&negative), Some(0));

        let full: Map = [(Key::Int(i64::MAX), Value::Null)].into_iter().collect();
        assert_eq!(next_index(&full), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Bool(true).to_string(), "1");
        assert_eq!(Value::Bool(false).to_string(), "");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::from(json!({"a": [1, 2]})).to_string(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_compare() {
        assert_eq!(Value::Int(2).compare(&Value::Float(1.5)), Ordering::Greater);
        assert_eq!(Value::from("a").compare(&Value::from("b")), Ordering::Less);
        assert_eq!(Value::Null.compare(&Value::Bool(false)), Ordering::Less);
        assert_eq!(Value::Int(100).compare(&Value::from("1")), Ordering::Less);
        assert_eq!(Value::Int(3).compare(&Value::Int(3)), Ordering::Equal);
    }

    #[test]
    fn test_strict_equality() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::from("1"));
        assert_ne!(Value::Bool(true), Value::Int(1));
    }
}
