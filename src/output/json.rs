//! JSON output formatting

use serde_json::json;

use crate::engine::executor::{ExecutionResult, ResultData};

pub fn format_json(result: &ExecutionResult) -> String {
    let data = match &result.data {
        ResultData::Items(container) => serde_json::to_value(container).unwrap_or(json!(null)),
        ResultData::Scalar(value) => serde_json::to_value(value).unwrap_or(json!(null)),
        ResultData::Flag(b) => json!(b),
        ResultData::Count(n) => json!(n),
        ResultData::Text(s) => json!(s),
    };

    let data = match &result.message {
        Some(message) => json!({ "result": data, "message": message }),
        None => data,
    };

    serde_json::to_string_pretty(&data).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::value::Value;

    #[test]
    fn test_format_items_as_document() {
        let container = Container::from_value(Value::from(json!({"a": [1, 2]}))).unwrap();
        let result = ExecutionResult {
            data: ResultData::Items(container),
            message: None,
        };
        let parsed: serde_json::Value = serde_json::from_str(&format_json(&result)).unwrap();
        assert_eq!(parsed, json!({"a": [1, 2]}));
    }

    #[test]
    fn test_format_with_message() {
        let result = ExecutionResult {
            data: ResultData::Count(4),
            message: Some("1 stage(s) applied".to_string()),
        };
        let parsed: serde_json::Value = serde_json::from_str(&format_json(&result)).unwrap();
        assert_eq!(parsed, json!({"result": 4, "message": "1 stage(s) applied"}));
    }
}
