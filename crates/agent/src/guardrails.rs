//! Guardrails for generator output. Responses are untrusted text: they are
//! parsed into a JSON object with a single repair step and then read field by
//! field, so one malformed value never poisons the rest.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm::GeneratorError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("generator output is not JSON: {0}")]
    Unparseable(String),
    #[error("generator output has the wrong shape: {0}")]
    Schema(String),
}

pub type JsonObject = Map<String, Value>;

/// Direct parse first, then the span between the first `{` and the last `}`.
pub fn parse_json_object(response: &str) -> Result<JsonObject, ExtractionError> {
    let trimmed = response.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return into_object(value);
    }

    let span = brace_span(trimmed).ok_or_else(|| ExtractionError::Unparseable(preview(trimmed)))?;
    serde_json::from_str::<Value>(span)
        .map_err(|error| ExtractionError::Unparseable(error.to_string()))
        .and_then(into_object)
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn into_object(value: Value) -> Result<JsonObject, ExtractionError> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(ExtractionError::Schema(format!("expected an object, got {other}"))),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(60).collect()
}

/// Missing, null and non-string values all read as `""`.
pub fn string_field(object: &JsonObject, key: &str) -> String {
    object.get(key).and_then(Value::as_str).map(str::trim).unwrap_or_default().to_string()
}

/// Non-negative integer from a number or a numeric string; fractional values truncate.
pub fn u32_field(object: &JsonObject, key: &str) -> Option<u32> {
    match object.get(key)? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|value| *value >= 0.0).map(|value| value as u64))
            .and_then(|value| u32::try_from(value).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}

pub fn f64_field(object: &JsonObject, key: &str) -> Option<f64> {
    match object.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{f64_field, parse_json_object, string_field, u32_field, ExtractionError};

    #[test]
    fn parses_clean_json_directly() -> Result<(), ExtractionError> {
        let object = parse_json_object(" {\"dish\": \"拉麵\"} ")?;
        assert_eq!(string_field(&object, "dish"), "拉麵");
        Ok(())
    }

    #[test]
    fn repairs_fenced_or_chatty_output() -> Result<(), ExtractionError> {
        let object = parse_json_object("好的！\n```json\n{\"location\": \"成大\"}\n```\n希望有幫助")?;
        assert_eq!(string_field(&object, "location"), "成大");
        assert_eq!(string_field(&object, "dish"), "");
        Ok(())
    }

    #[test]
    fn rejects_text_without_an_object() {
        assert!(matches!(parse_json_object("no json here"), Err(ExtractionError::Unparseable(_))));
        assert!(matches!(parse_json_object("} backwards {"), Err(ExtractionError::Unparseable(_))));
        assert!(matches!(parse_json_object("[1, 2]"), Err(ExtractionError::Schema(_))));
    }

    #[test]
    fn numeric_fields_coerce_or_decline() {
        let object = json!({
            "a": 20, "b": "15", "c": 12.9, "d": -3, "e": "soon", "f": null,
            "g": 4.5, "h": "3.5", "i": true
        });
        let object = object.as_object().cloned().unwrap_or_default();

        assert_eq!(u32_field(&object, "a"), Some(20));
        assert_eq!(u32_field(&object, "b"), Some(15));
        assert_eq!(u32_field(&object, "c"), Some(12));
        assert_eq!(u32_field(&object, "d"), None);
        assert_eq!(u32_field(&object, "e"), None);
        assert_eq!(u32_field(&object, "f"), None);
        assert_eq!(f64_field(&object, "g"), Some(4.5));
        assert_eq!(f64_field(&object, "h"), Some(3.5));
        assert_eq!(f64_field(&object, "i"), None);
        assert_eq!(f64_field(&object, "missing"), None);
    }
}
