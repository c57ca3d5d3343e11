//! Primitive - an ordered, nested key/value container with a pipe language
//!
//! [`Container`] wraps an ordered map of [`Value`]s and offers list and map
//! operations, recursive search, set-style views, JSON/file persistence and
//! a snapshot to revert to. The same operations are reachable as pipeline
//! stages, which is what the `primitive` binary runs.
//!
//! # Example
//!
//! ```no_run
//! use primitive::{parse_pipeline, execute_pipeline, Container, ExecutionContext, OutputFormat, format_output};
//!
//! let mut data = Container::from_json_str(r#"{"a": {"k": 1}, "b": {"k": 2}}"#).unwrap();
//! let pipeline = parse_pipeline("where k=2 | keys").unwrap();
//! let result = execute_pipeline(&pipeline, &mut data, &ExecutionContext::default()).unwrap();
//! println!("{}", format_output(&result, &OutputFormat::Human));
//! ```

pub mod cli;
pub mod container;
pub mod engine;
pub mod error;
pub mod output;
pub mod parser;
pub mod repl;
pub mod value;

pub use container::{is_json, Condition, Container, JsonStyle, KeyMode};
pub use engine::{execute_pipeline, ExecutionContext, ExecutionResult, ResultData};
pub use error::{ContainerError, Result};
pub use output::{format_output, OutputFormat};
pub use parser::{parse_pipeline, Pipeline, Stage};
pub use value::{Key, Map, Value};
