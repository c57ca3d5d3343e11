//! Map keys
//!
//! Keys are either integers or strings. A string that is the canonical
//! decimal spelling of an `i64` is stored as an integer, so `"7"` read back
//! from a JSON object member is the same key as `7`.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{ContainerError, Result};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl Key {
    /// Build a key from a string, normalizing integer-looking strings.
    pub fn parse(s: &str) -> Self {
        if is_canonical_int(s) {
            if let Ok(n) = s.parse::<i64>() {
                return Key::Int(n);
            }
        }
        Key::Str(s.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            Key::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            Key::Int(_) => None,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Key::Int(_))
    }

    /// The key as a value, for flips and key listings.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Int(n) => Value::Int(*n),
            Key::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// `"0"`, `"42"`, `"-7"` are canonical; `"007"`, `"-0"`, `"+1"`, `""` are not.
fn is_canonical_int(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return false;
    }
    !(s.starts_with('-') && digits == "0")
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{}", n),
            Key::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n as i64)
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::Int(n as i64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::parse(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::parse(&s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::parse(s)
    }
}

impl TryFrom<&Value> for Key {
    type Error = ContainerError;

    /// Only integers and strings can become keys.
    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Int(n) => Ok(Key::Int(*n)),
            Value::Str(s) => Ok(Key::parse(s)),
            other => Err(ContainerError::InvalidArgument(format!(
                "{} can not be used as a key",
                other.type_name()
            ))),
        }
    }
}

// JSON object members are always strings.
impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Key::Int(n) => serializer.collect_str(n),
            Key::Str(s) => serializer.serialize_str(s),
        }
    }
}
