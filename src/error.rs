//! Error types for Primitive

use thiserror::Error;

use crate::value::Key;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Empty container")]
    Empty,

    #[error("Offset not exists: {0}")]
    MissingOffset(Key),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Can't convert to Container: {0}")]
    Decode(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Parent directory does not exist: {0}")]
    MissingParent(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ContainerError>;
