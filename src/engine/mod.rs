//! Execution engine for pipelines

pub mod executor;

pub use executor::{execute_pipeline, ExecutionContext, ExecutionResult, ResultData};
