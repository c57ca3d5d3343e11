//! Human-readable output formatting

use crate::engine::executor::{ExecutionResult, ResultData};
use crate::value::{Map, Value};

const INDENT: &str = "  ";

pub fn format_human(result: &ExecutionResult) -> String {
    let mut output = match &result.data {
        ResultData::Items(container) => {
            let header = format!("Items ({})", container.len());
            let mut output = format!("{}\n{}\n", header, "-".repeat(header.len()));
            if container.is_empty() {
                output.push_str("(empty)\n");
            } else {
                render_map(container.all(), 0, &mut output);
            }
            output
        }
        ResultData::Scalar(value) => format!("{}\n", scalar(value)),
        ResultData::Flag(b) => format!("{}\n", b),
        ResultData::Count(n) => format!("{}\n", n),
        ResultData::Text(s) => format!("{}\n", s),
    };

    if let Some(ref message) = result.message {
        output.push('\n');
        output.push_str(message);
        output.push('\n');
    }
    output
}

fn render_map(map: &Map, depth: usize, output: &mut String) {
    let pad = INDENT.repeat(depth);
    for (key, value) in map {
        match value {
            Value::Map(inner) if !inner.is_empty() => {
                output.push_str(&format!("{}{}:\n", pad, key));
                render_map(inner, depth + 1, output);
            }
            Value::Map(_) => output.push_str(&format!("{}{}: {{}}\n", pad, key)),
            other => output.push_str(&format!("{}{}: {}\n", pad, key, scalar(other))),
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Str(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use serde_json::json;

    fn items(json: serde_json::Value) -> ExecutionResult {
        ExecutionResult {
            data: ResultData::Items(Container::from_value(Value::from(json)).unwrap()),
            message: None,
        }
    }

    #[test]
    fn test_format_nested_items() {
        let output = format_human(&items(json!({"a": {"k": 1, "s": "x"}, "b": null, "c": {}})));
        assert_eq!(
            output,
            "Items (3)\n---------\na:\n  k: 1\n  s: \"x\"\nb: null\nc: {}\n"
        );
    }

    #[test]
    fn test_format_empty_items() {
        let output = format_human(&items(json!([])));
        assert!(output.contains("Items (0)"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_format_single_results() {
        let flag = ExecutionResult {
            data: ResultData::Flag(true),
            message: Some("done".to_string()),
        };
        assert_eq!(format_human(&flag), "true\n\ndone\n");

        let text = ExecutionResult {
            data: ResultData::Text("a b".to_string()),
            message: None,
        };
        assert_eq!(format_human(&text), "a b\n");
    }
}
