//! Pest grammar parser for the pipe language

use pest::Parser;
use pest_derive::Parser;

use crate::error::{ContainerError, Result};
use crate::parser::ast::*;
use crate::value::{Key, Value};

#[derive(Parser)]
#[grammar = "../grammar/pipeline.pest"]
pub struct PipelineParser;

/// Parse a pipeline string such as `where k=2 | keys` into an AST
pub fn parse_pipeline(input: &str) -> Result<Pipeline> {
    let pairs = PipelineParser::parse(Rule::pipeline, input)
        .map_err(|e| ContainerError::ParseError(e.to_string()))?;

    let pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| ContainerError::ParseError("Empty pipeline".to_string()))?;

    let mut stages = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::stage {
            stages.push(parse_stage(inner)?);
        }
    }

    Ok(Pipeline { stages })
}

fn parse_stage(pair: pest::iterators::Pair<Rule>) -> Result<Stage> {
    let mut inner = pair.into_inner();

    let name = inner
        .next()
        .ok_or_else(|| ContainerError::ParseError("Expected stage name".to_string()))?
        .as_str()
        .to_string();

    let args = inner.map(parse_argument).collect::<Result<Vec<_>>>()?;

    Ok(Stage { name, args })
}

fn parse_argument(pair: pest::iterators::Pair<Rule>) -> Result<Argument> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ContainerError::ParseError("Expected argument".to_string()))?;

    match inner.as_rule() {
        Rule::pair => {
            let mut parts = inner.into_inner();
            let key = parts
                .next()
                .ok_or_else(|| ContainerError::ParseError("Expected key".to_string()))?;
            let value = parts
                .next()
                .ok_or_else(|| ContainerError::ParseError("Expected value after '='".to_string()))?;
            Ok(Argument::Pair(parse_key(key)?, parse_literal(value)?))
        }
        Rule::literal => Ok(Argument::Value(parse_literal(inner)?)),
        _ => Err(ContainerError::ParseError(format!(
            "Unexpected rule in argument: {:?}",
            inner.as_rule()
        ))),
    }
}

fn parse_key(pair: pest::iterators::Pair<Rule>) -> Result<Key> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ContainerError::ParseError("Expected key".to_string()))?;

    match inner.as_rule() {
        Rule::string_value => Ok(Key::from(parse_string(inner)?)),
        Rule::integer | Rule::word => Ok(Key::from(inner.as_str())),
        _ => Err(ContainerError::ParseError(format!(
            "Unexpected rule in key: {:?}",
            inner.as_rule()
        ))),
    }
}

fn parse_literal(pair: pest::iterators::Pair<Rule>) -> Result<Value> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| ContainerError::ParseError("Expected value".to_string()))?;

    match inner.as_rule() {
        Rule::string_value => Ok(Value::Str(parse_string(inner)?)),
        Rule::number => {
            let text = inner.as_str();
            if text.contains('.') {
                let n: f64 = text
                    .parse()
                    .map_err(|_| ContainerError::ParseError(format!("Invalid number: {}", text)))?;
                Ok(Value::Float(n))
            } else {
                let n: i64 = text
                    .parse()
                    .map_err(|_| ContainerError::ParseError(format!("Invalid integer: {}", text)))?;
                Ok(Value::Int(n))
            }
        }
        Rule::boolean => Ok(Value::Bool(inner.as_str().eq_ignore_ascii_case("true"))),
        Rule::null_value => Ok(Value::Null),
        Rule::word => Ok(Value::Str(inner.as_str().to_string())),
        _ => Err(ContainerError::ParseError(format!(
            "Unexpected rule in value: {:?}",
            inner.as_rule()
        ))),
    }
}

fn parse_string(pair: pest::iterators::Pair<Rule>) -> Result<String> {
    let raw = pair
        .into_inner()
        .next()
        .map(|p| p.as_str())
        .unwrap_or_default();
    unescape(raw)
}

fn unescape(raw: &str) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other @ ('"' | '\\')) => out.push(other),
            other => {
                return Err(ContainerError::ParseError(format!(
                    "Invalid escape sequence: \\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}
