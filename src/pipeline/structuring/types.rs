//! Trait seam and result types for the structuring layer.

use serde::Serialize;
use serde_json::{Map, Value};

use super::StructuringError;
use crate::db::FlatRecord;

/// Sends a system + user prompt pair to a chat-completion endpoint and
/// returns the assistant's text.
pub trait ChatClient: Send + Sync {
    fn complete(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, StructuringError>;
}

/// What structuring a document produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutcome {
    /// The model returned a parseable JSON object.
    Structured(Map<String, Value>),
    /// Extraction failed even after the retry; the caller decides what to do
    /// with the raw material.
    Fallback(FallbackPayload),
}

/// Carried instead of an error when the model never produced valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackPayload {
    /// The OCR text that was sent to the model.
    pub raw_text: String,
    /// The model's final raw response.
    pub structured_data: String,
    pub error: String,
}

/// A record is storable only when every value is a string.
pub fn is_flat_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().all(Value::is_string),
        _ => false,
    }
}

/// Convert a JSON object into a column→text map. Strings pass through;
/// everything else becomes its JSON serialization.
pub fn flatten_for_storage(object: &Map<String, Value>) -> FlatRecord {
    object
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_object_accepted() {
        assert!(is_flat_object(&json!({"Name": "Alice", "Email": "a@x.com"})));
    }

    #[test]
    fn empty_object_is_flat() {
        assert!(is_flat_object(&json!({})));
    }

    #[test]
    fn non_string_values_are_not_flat() {
        assert!(!is_flat_object(&json!({"Name": "Alice", "Age": 30})));
        assert!(!is_flat_object(&json!({"Tags": ["a", "b"]})));
        assert!(!is_flat_object(&json!({"Nested": {"x": "y"}})));
        assert!(!is_flat_object(&json!({"Missing": null})));
    }

    #[test]
    fn arrays_and_scalars_are_not_flat() {
        assert!(!is_flat_object(&json!(["a", "b"])));
        assert!(!is_flat_object(&json!("just a string")));
        assert!(!is_flat_object(&json!(42)));
    }

    #[test]
    fn flatten_stringifies_non_strings() {
        let object = json!({
            "Name": "Alice",
            "Age": 30,
            "Active": true,
            "Note": null,
            "Tags": ["a", "b"],
            "Address": {"city": "Oslo"}
        });
        let Value::Object(map) = object else {
            unreachable!()
        };
        let flat = flatten_for_storage(&map);

        assert_eq!(flat["Name"], "Alice");
        assert_eq!(flat["Age"], "30");
        assert_eq!(flat["Active"], "true");
        assert_eq!(flat["Note"], "null");
        assert_eq!(flat["Tags"], r#"["a","b"]"#);
        assert_eq!(flat["Address"], r#"{"city":"Oslo"}"#);
    }
}
