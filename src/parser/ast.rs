//! Abstract Syntax Tree definitions for the pipe language

use crate::value::{Key, Value};

/// A sequence of stages separated by `|`
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

/// One operation with its arguments, e.g. `cut 1 -1`
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// A bare literal (`2`, `"text"`, `name`)
    Value(Value),
    /// A `key=value` pair
    Pair(Key, Value),
}

impl Stage {
    /// Number of arguments
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            match arg {
                Argument::Value(Value::Str(s)) => write!(f, " {:?}", s)?,
                Argument::Value(v) => write!(f, " {}", serde_json::to_string(v).unwrap_or_default())?,
                Argument::Pair(k, v) => {
                    write!(f, " {}={}", k, serde_json::to_string(v).unwrap_or_default())?
                }
            }
        }
        Ok(())
    }
}
