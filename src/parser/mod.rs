//! Parser module for the pipe language

pub mod ast;
pub mod grammar;

pub use ast::*;
pub use grammar::parse_pipeline;
