//! JSON parsing and schema validation for structured generation.

use super::ProviderError;
use jsonschema::{Draft, JSONSchema};
use schemars::JsonSchema;
use serde_json::Value;

/// JSON Schema for a Rust type, for use with `generate_structured`.
pub fn json_schema_for<T: JsonSchema>() -> Value {
    let root = schemars::schema_for!(T);
    serde_json::to_value(root).unwrap_or(Value::Bool(true))
}

/// Parse model output as JSON and validate it against `schema`.
///
/// Markdown code fences around the payload are tolerated.
pub fn parse_and_validate(provider: &str, content: &str, schema: &Value) -> Result<Value, ProviderError> {
    let payload = strip_code_fence(content);
    let value: Value = serde_json::from_str(payload).map_err(|e| {
        ProviderError::other(provider, format!("response is not valid JSON: {}", e))
    })?;
    validate(provider, &value, schema)?;
    Ok(value)
}

pub fn validate(provider: &str, value: &Value, schema: &Value) -> Result<(), ProviderError> {
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| ProviderError::other(provider, format!("invalid schema: {}", e)))?;

    let violations: Vec<String> = match compiled.validate(value) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|e| format!("{} at '{}'", e, e.instance_path))
            .collect(),
    };
    Err(ProviderError::other(
        provider,
        format!("schema violation: {}", violations.join("; ")),
    ))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiz_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {"type": "string"},
                "options": {"type": "array", "items": {"type": "string"}, "minItems": 2}
            },
            "required": ["question", "options"]
        })
    }

    #[test]
    fn test_valid_payload() {
        let v = parse_and_validate("p", r#"{"question":"2+2?","options":["3","4"]}"#, &quiz_schema()).unwrap();
        assert_eq!(v["question"], "2+2?");
    }

    #[test]
    fn test_fenced_payload() {
        let content = "```json\n{\"question\":\"q\",\"options\":[\"a\",\"b\"]}\n```";
        assert!(parse_and_validate("p", content, &quiz_schema()).is_ok());
    }

    #[test]
    fn test_schema_violation_is_generic_provider_error() {
        let err = parse_and_validate("p", r#"{"question":"q","options":["a"]}"#, &quiz_schema()).unwrap_err();
        assert!(matches!(err, ProviderError::Provider { .. }));
        assert!(err.message().contains("schema violation"));
    }

    #[test]
    fn test_non_json_is_generic_provider_error() {
        let err = parse_and_validate("p", "Sure! Here is your quiz.", &quiz_schema()).unwrap_err();
        assert!(err.message().contains("not valid JSON"));
    }

    #[test]
    fn test_schema_from_type() {
        #[derive(JsonSchema)]
        #[allow(dead_code)]
        struct Flashcard {
            front: String,
            back: String,
        }
        let schema = json_schema_for::<Flashcard>();
        assert!(validate("p", &json!({"front": "a", "back": "b"}), &schema).is_ok());
        assert!(validate("p", &json!({"front": "a"}), &schema).is_err());
    }
}
