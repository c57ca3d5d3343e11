//! Pipeline executor

use crate::container::{Condition, Container, KeyMode};
use crate::error::{ContainerError, Result};
use crate::output::OutputFormat;
use crate::parser::{Argument, Pipeline, Stage};
use crate::value::{Key, Value};

/// Execution context containing runtime configuration
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Human,
            verbose: false,
        }
    }
}

/// Result of pipeline execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub data: ResultData,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ResultData {
    /// The working container after the last stage
    Items(Container),
    /// A single value (`first`, `last`, `sum`, `find`)
    Scalar(Value),
    /// A yes/no answer (`has`, `is_assoc`, `changed`, ...)
    Flag(bool),
    Count(usize),
    /// Free text (`implode`, `encrypt`)
    Text(String),
}

/// What a stage leaves behind
enum Outcome {
    Continue,
    Done(ResultData),
}

/// Run every stage of `pipeline` against `container`.
///
/// Stages run on a working copy that replaces `container` only when the
/// whole pipeline succeeds, so a caller holding it (the repl) keeps either
/// the full result or its previous state. A stage that produces a scalar
/// must be the last one.
pub fn execute_pipeline(
    pipeline: &Pipeline,
    container: &mut Container,
    ctx: &ExecutionContext,
) -> Result<ExecutionResult> {
    let total = pipeline.stages.len();
    let mut work = container.clone();

    for (index, stage) in pipeline.stages.iter().enumerate() {
        log::debug!("stage {}/{}: {}", index + 1, total, stage);
        match execute_stage(stage, &mut work)? {
            Outcome::Continue => {}
            Outcome::Done(data) => {
                if index + 1 < total {
                    return Err(ContainerError::InvalidArgument(format!(
                        "'{}' produces a single result and must be the last stage",
                        stage.name
                    )));
                }
                let message = summary(ctx, total, &work);
                *container = work;
                return Ok(ExecutionResult { data, message });
            }
        }
    }

    let message = summary(ctx, total, &work);
    *container = work;
    Ok(ExecutionResult {
        data: ResultData::Items(container.clone()),
        message,
    })
}

fn summary(ctx: &ExecutionContext, stages: usize, container: &Container) -> Option<String> {
    ctx.verbose.then(|| {
        format!(
            "{} stage(s) applied, {} item(s) in container{}",
            stages,
            container.len(),
            if container.is_changed() { " (changed)" } else { "" }
        )
    })
}

/// Execute a single stage
fn execute_stage(stage: &Stage, container: &mut Container) -> Result<Outcome> {
    match stage.name.as_str() {
        // Search and filtering
        "where" => {
            container.select(&condition(stage)?, KeyMode::Parent)?;
        }
        "where_list" => {
            container.select(&condition(stage)?, KeyMode::Sequential)?;
        }
        "find_where" => {
            container.find_where(&condition(stage)?)?;
        }
        "without" => {
            arity(stage, 1, 2)?;
            let removed = container.without(key_arg(stage, 0)?, bool_arg(stage, 1, true)?);
            log::debug!("without removed {} entries", removed);
        }
        "pull" => {
            arity(stage, 1, 1)?;
            container.pull(key_arg(stage, 0)?);
        }
        "flatten" => {
            arity(stage, 0, 0)?;
            container.flatten();
        }
        "truthy" => {
            arity(stage, 0, 1)?;
            container.truthy(bool_arg(stage, 0, false)?);
        }
        "grep" => {
            arity(stage, 1, 1)?;
            container.grep(&str_arg(stage, 0)?)?;
        }

        // Reordering and reshaping
        "unique" => {
            arity(stage, 0, 0)?;
            container.unique();
        }
        "reverse" => {
            arity(stage, 0, 1)?;
            container.reverse(bool_arg(stage, 0, true)?);
        }
        "line_keys" => {
            arity(stage, 0, 0)?;
            container.line_keys();
        }
        "flip" => {
            arity(stage, 0, 0)?;
            container.flip()?;
        }
        "shuffle" => {
            arity(stage, 0, 0)?;
            container.shuffle();
        }
        "sort" => {
            arity(stage, 0, 1)?;
            let descending = match stage.args.first() {
                None => false,
                Some(Argument::Value(Value::Str(s))) if s == "asc" => false,
                Some(Argument::Value(Value::Str(s))) if s == "desc" => true,
                Some(_) => {
                    return Err(ContainerError::InvalidArgument(
                        "sort takes 'asc' or 'desc'".to_string(),
                    ))
                }
            };
            if descending {
                container.sort_by(|a, b| b.compare(a));
            } else {
                container.sort_by(Value::compare);
            }
        }
        "sort_keys" => {
            arity(stage, 0, 0)?;
            container.sort_keys();
        }
        "take" => {
            arity(stage, 1, 1)?;
            container.take(key_arg(stage, 0)?)?;
        }
        "cut" => {
            arity(stage, 1, 3)?;
            let offset = int_arg(stage, 0)?;
            let length = match stage.args.get(1) {
                None | Some(Argument::Value(Value::Null)) => None,
                Some(_) => Some(int_arg(stage, 1)?),
            };
            container.cut(offset, length, bool_arg(stage, 2, false)?);
        }
        "pad" => {
            arity(stage, 0, 2)?;
            let size = if stage.args.is_empty() {
                1
            } else {
                int_arg(stage, 0)?
            };
            let value = match stage.args.get(1) {
                Some(_) => value_arg(stage, 1)?.clone(),
                None => Value::Int(0),
            };
            container.pad(size, value);
        }

        // Adding and removing entries
        "push" => {
            arity(stage, 1, usize::MAX)?;
            for index in 0..stage.arity() {
                container.push(value_arg(stage, index)?.clone())?;
            }
        }
        "insert" => {
            arity(stage, 1, usize::MAX)?;
            for arg in &stage.args {
                match arg {
                    Argument::Pair(key, value) => container.insert(key.clone(), value.clone()),
                    Argument::Value(_) => {
                        return Err(ContainerError::InvalidArgument(
                            "insert takes key=value pairs".to_string(),
                        ))
                    }
                }
            }
        }
        "forget" => {
            arity(stage, 1, usize::MAX)?;
            for index in 0..stage.arity() {
                container.forget(key_arg(stage, index)?);
            }
        }

        // Views replace the working container
        "keys" => {
            arity(stage, 0, 0)?;
            *container = container.keys();
        }
        "values" => {
            arity(stage, 0, 0)?;
            *container = container.values();
        }
        "chunk" => {
            arity(stage, 0, 1)?;
            let size = if stage.args.is_empty() {
                2
            } else {
                usize_arg(stage, 0)?
            };
            *container = container.chunk(size)?;
        }
        "initial" => {
            arity(stage, 0, 1)?;
            let count = if stage.args.is_empty() {
                1
            } else {
                usize_arg(stage, 0)?
            };
            *container = container.initial(count)?;
        }
        "rest" => {
            arity(stage, 1, 1)?;
            *container = container.rest(usize_arg(stage, 0)?)?;
        }
        "column" => {
            arity(stage, 1, 1)?;
            *container = container.column(key_arg(stage, 0)?);
        }
        "count_values" => {
            arity(stage, 0, 0)?;
            *container = container.count_values()?;
        }

        // Snapshot
        "save" => {
            arity(stage, 0, 0)?;
            container.save();
        }
        "revert" => {
            arity(stage, 0, 0)?;
            container.revert();
        }

        // Single results
        "count" => {
            arity(stage, 0, 0)?;
            return Ok(Outcome::Done(ResultData::Count(container.len())));
        }
        "sum" => {
            arity(stage, 0, 0)?;
            return Ok(Outcome::Done(ResultData::Scalar(container.sum()?)));
        }
        "first" => {
            arity(stage, 0, 0)?;
            return Ok(Outcome::Done(ResultData::Scalar(container.first()?.clone())));
        }
        "last" => {
            arity(stage, 0, 0)?;
            return Ok(Outcome::Done(ResultData::Scalar(container.last()?.clone())));
        }
        "has" => {
            arity(stage, 1, 1)?;
            let found = container.has(value_arg(stage, 0)?);
            return Ok(Outcome::Done(ResultData::Flag(found)));
        }
        "has_key" => {
            arity(stage, 1, 1)?;
            let found = container.has_key(key_arg(stage, 0)?);
            return Ok(Outcome::Done(ResultData::Flag(found)));
        }
        "find" => {
            arity(stage, 1, 1)?;
            let key = container
                .find(value_arg(stage, 0)?)
                .map(Key::to_value)
                .unwrap_or(Value::Null);
            return Ok(Outcome::Done(ResultData::Scalar(key)));
        }
        "implode" => {
            arity(stage, 0, 1)?;
            let delimiter = if stage.args.is_empty() {
                " ".to_string()
            } else {
                str_arg(stage, 0)?
            };
            return Ok(Outcome::Done(ResultData::Text(container.implode(&delimiter))));
        }
        "is_assoc" => {
            arity(stage, 0, 0)?;
            return Ok(Outcome::Done(ResultData::Flag(container.is_assoc())));
        }
        "is_multi" => {
            arity(stage, 0, 0)?;
            return Ok(Outcome::Done(ResultData::Flag(container.is_multi())));
        }
        "changed" => {
            arity(stage, 0, 0)?;
            return Ok(Outcome::Done(ResultData::Flag(container.is_changed())));
        }
        "encrypt" => {
            arity(stage, 0, 0)?;
            return Ok(Outcome::Done(ResultData::Text(container.encrypt()?)));
        }

        other => {
            return Err(ContainerError::Unsupported(format!(
                "Call to undefined stage '{}'",
                other
            )))
        }
    }

    Ok(Outcome::Continue)
}

// ============================================================================
// Argument helpers
// ============================================================================

fn arity(stage: &Stage, min: usize, max: usize) -> Result<()> {
    let n = stage.arity();
    if n < min || n > max {
        let expected = if min == max {
            format!("{}", min)
        } else if max == usize::MAX {
            format!("at least {}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(ContainerError::InvalidArgument(format!(
            "{} takes {} argument(s), got {}",
            stage.name, expected, n
        )));
    }
    Ok(())
}

/// A bare key for `where k`, or `k=v` pairs ANDed together
fn condition(stage: &Stage) -> Result<Condition> {
    match stage.args.as_slice() {
        [Argument::Value(v)] => Ok(Condition::Key(Key::try_from(v)?)),
        args if !args.is_empty() => {
            let pairs = args
                .iter()
                .map(|arg| match arg {
                    Argument::Pair(k, v) => Ok((k.clone(), v.clone())),
                    Argument::Value(_) => Err(ContainerError::InvalidArgument(format!(
                        "{} takes one key or key=value pairs",
                        stage.name
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Condition::Pairs(pairs))
        }
        _ => Err(ContainerError::InvalidArgument(format!(
            "{} needs a key or key=value pairs",
            stage.name
        ))),
    }
}

fn value_arg(stage: &Stage, index: usize) -> Result<&Value> {
    match stage.args.get(index) {
        Some(Argument::Value(v)) => Ok(v),
        Some(Argument::Pair(k, _)) => Err(ContainerError::InvalidArgument(format!(
            "{}: unexpected pair '{}=' at position {}",
            stage.name,
            k,
            index + 1
        ))),
        None => Err(ContainerError::InvalidArgument(format!(
            "{}: missing argument {}",
            stage.name,
            index + 1
        ))),
    }
}

fn key_arg(stage: &Stage, index: usize) -> Result<Key> {
    Key::try_from(value_arg(stage, index)?)
}

fn int_arg(stage: &Stage, index: usize) -> Result<i64> {
    value_arg(stage, index)?.as_i64().ok_or_else(|| {
        ContainerError::InvalidArgument(format!(
            "{}: argument {} must be an integer",
            stage.name,
            index + 1
        ))
    })
}

fn usize_arg(stage: &Stage, index: usize) -> Result<usize> {
    let n = int_arg(stage, index)?;
    usize::try_from(n).map_err(|_| {
        ContainerError::InvalidArgument(format!(
            "{}: argument {} must not be negative",
            stage.name,
            index + 1
        ))
    })
}

fn bool_arg(stage: &Stage, index: usize, default: bool) -> Result<bool> {
    match stage.args.get(index) {
        None => Ok(default),
        Some(_) => match value_arg(stage, index)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(ContainerError::InvalidArgument(format!(
                "{}: argument {} must be true or false",
                stage.name,
                index + 1
            ))),
        },
    }
}

fn str_arg(stage: &Stage, index: usize) -> Result<String> {
    match value_arg(stage, index)? {
        Value::Str(s) => Ok(s.clone()),
        Value::Map(_) => Err(ContainerError::InvalidArgument(format!(
            "{}: argument {} must be a string",
            stage.name,
            index + 1
        ))),
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_pipeline;
    use serde_json::json;

    fn container(json: serde_json::Value) -> Container {
        Container::from_value(Value::from(json)).unwrap()
    }

    fn run(input: &str, c: &mut Container) -> Result<ExecutionResult> {
        let pipeline = parse_pipeline(input)?;
        execute_pipeline(&pipeline, c, &ExecutionContext::default())
    }

    fn sample() -> Container {
        container(json!({"a": {"k": 1, "x": 1}, "b": {"k": 2, "y": 2}, "c": {"z": 3}}))
    }

    #[test]
    fn test_where_key() {
        let mut c = sample();
        let result = run("where k | keys", &mut c).unwrap();
        match result.data {
            ResultData::Items(items) => {
                assert_eq!(items.to_value(), Value::from(json!(["a", "b"])));
            }
            _ => panic!("Expected Items result"),
        }
    }

    #[test]
    fn test_where_pair() {
        let mut c = sample();
        run("where k=2", &mut c).unwrap();
        assert_eq!(c.to_value(), Value::from(json!({"b": {"k": 2, "y": 2}})));
    }

    #[test]
    fn test_where_list_and_count() {
        let mut c = sample();
        let result = run("where_list k | count", &mut c).unwrap();
        match result.data {
            ResultData::Count(n) => assert_eq!(n, 2),
            _ => panic!("Expected Count result"),
        }
        assert!(c.to_value().is_list());
    }

    #[test]
    fn test_find_where() {
        let mut c = sample();
        run("find_where k=1", &mut c).unwrap();
        assert_eq!(c.to_value(), Value::from(json!({"k": 1, "x": 1})));
    }

    #[test]
    fn test_without_defaults_to_recursive() {
        let mut c = sample();
        run("without k", &mut c).unwrap();
        assert_eq!(
            c.to_value(),
            Value::from(json!({"a": {"x": 1}, "b": {"y": 2}, "c": {"z": 3}}))
        );

        let mut top = sample();
        run("without k false", &mut top).unwrap();
        assert_eq!(top.to_value(), sample().to_value());
    }

    #[test]
    fn test_cut_and_sum() {
        let mut c = container(json!([1, 2, 3, 4, 5]));
        let result = run("cut 1 -1 | sum", &mut c).unwrap();
        match result.data {
            ResultData::Scalar(v) => assert_eq!(v, Value::Int(9)),
            _ => panic!("Expected Scalar result"),
        }
    }

    #[test]
    fn test_sort_descending() {
        let mut c = container(json!([3, "b", 1.5, "a", null]));
        run("sort desc", &mut c).unwrap();
        assert_eq!(c.to_value(), Value::from(json!(["b", "a", 3, 1.5, null])));
    }

    #[test]
    fn test_push_insert_forget() {
        let mut c = container(json!({"a": 1}));
        run("push x y | insert b=2 c=\"three\" | forget a 0", &mut c).unwrap();
        assert_eq!(c.to_value(), Value::from(json!({"1": "y", "b": 2, "c": "three"})));
    }

    #[test]
    fn test_views_replace_container() {
        let mut c = container(json!({"a": "x", "b": "y", "c": "x"}));
        run("count_values", &mut c).unwrap();
        assert_eq!(c.to_value(), Value::from(json!({"x": 2, "y": 1})));

        let mut chunks = container(json!([1, 2, 3]));
        run("chunk", &mut chunks).unwrap();
        assert_eq!(chunks.to_value(), Value::from(json!([[1, 2], [3]])));
    }

    #[test]
    fn test_scalar_results() {
        let mut c = container(json!({"a": "x", "b": "y"}));
        match run("has y", &mut c).unwrap().data {
            ResultData::Flag(b) => assert!(b),
            _ => panic!("Expected Flag result"),
        }
        match run("find y", &mut c).unwrap().data {
            ResultData::Scalar(v) => assert_eq!(v, Value::from("b")),
            _ => panic!("Expected Scalar result"),
        }
        match run("find nope", &mut c).unwrap().data {
            ResultData::Scalar(v) => assert_eq!(v, Value::Null),
            _ => panic!("Expected Scalar result"),
        }
        match run("implode \",\"", &mut c).unwrap().data {
            ResultData::Text(s) => assert_eq!(s, "x,y"),
            _ => panic!("Expected Text result"),
        }
    }

    #[test]
    fn test_changed_and_revert() {
        let mut c = container(json!([1, 2]));
        match run("push 3 | changed", &mut c).unwrap().data {
            ResultData::Flag(b) => assert!(b),
            _ => panic!("Expected Flag result"),
        }
        run("revert", &mut c).unwrap();
        assert_eq!(c.to_value(), Value::from(json!([1, 2])));
    }

    #[test]
    fn test_encrypt_stage() {
        let mut c = container(json!({"a": "alpha"}));
        match run("encrypt", &mut c).unwrap().data {
            ResultData::Text(payload) => {
                let back = Container::decrypt(&payload).unwrap();
                assert_eq!(back.to_value(), c.to_value());
            }
            _ => panic!("Expected Text result"),
        }
    }

    #[test]
    fn test_scalar_stage_must_be_last() {
        let mut c = container(json!([1, 2]));
        assert!(matches!(
            run("count | keys", &mut c),
            Err(ContainerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_failed_pipeline_leaves_container_untouched() {
        let mut c = container(json!([1, 2]));
        assert!(matches!(
            run("push 3 | take zz", &mut c),
            Err(ContainerError::MissingOffset(_))
        ));
        assert_eq!(c.len(), 2);
        assert!(!c.is_changed());

        assert!(run("push 3 | count | keys", &mut c).is_err());
        assert_eq!(c.to_value(), Value::from(json!([1, 2])));
    }

    #[test]
    fn test_unknown_stage() {
        let mut c = container(json!([1]));
        assert!(matches!(
            run("explode", &mut c),
            Err(ContainerError::Unsupported(_))
        ));
    }

    #[test]
    fn test_bad_arguments() {
        let mut c = container(json!([1, 2, 3]));
        assert!(matches!(run("take", &mut c), Err(ContainerError::InvalidArgument(_))));
        assert!(matches!(run("cut x", &mut c), Err(ContainerError::InvalidArgument(_))));
        assert!(matches!(run("chunk -1", &mut c), Err(ContainerError::InvalidArgument(_))));
        assert!(matches!(run("where 1.5", &mut c), Err(ContainerError::InvalidArgument(_))));
        assert!(matches!(run("where a=1 b", &mut c), Err(ContainerError::InvalidArgument(_))));
        assert!(matches!(run("reverse 1", &mut c), Err(ContainerError::InvalidArgument(_))));
        assert!(matches!(run("sort sideways", &mut c), Err(ContainerError::InvalidArgument(_))));
    }

    #[test]
    fn test_verbose_message() {
        let mut c = container(json!([1, 2]));
        let ctx = ExecutionContext {
            verbose: true,
            ..Default::default()
        };
        let result = execute_pipeline(&parse_pipeline("push 3").unwrap(), &mut c, &ctx).unwrap();
        let message = result.message.unwrap();
        assert!(message.contains("3 item(s)"));
        assert!(message.contains("changed"));
    }
}
