//! Structuring orchestration: one chat call, one retry, then fallback.

use std::sync::Arc;

use super::parser::extract_json_from_text;
use super::prompt::{build_user_prompt, SYSTEM_PROMPT};
use super::types::{ChatClient, FallbackPayload, StructuredOutcome};
use super::StructuringError;

const FALLBACK_ERROR: &str = "Response was not in JSON format";

pub struct Structurer {
    chat: Arc<dyn ChatClient>,
}

impl Structurer {
    pub fn new(chat: Arc<dyn ChatClient>) -> Self {
        Self { chat }
    }

    /// Ask the model to structure `ocr_text` into a flat JSON object.
    ///
    /// A response that yields no JSON object triggers exactly one fresh
    /// request. If that also fails to yield an object, the outcome is a
    /// fallback payload rather than an error; transport and API failures
    /// still propagate as `Err`.
    pub fn structure_text(&self, ocr_text: &str) -> Result<StructuredOutcome, StructuringError> {
        let user_prompt = build_user_prompt(ocr_text);

        let response = self.chat.complete(SYSTEM_PROMPT, &user_prompt)?;
        if let Some(object) = extract_json_from_text(&response) {
            return Ok(StructuredOutcome::Structured(object));
        }

        tracing::warn!(
            response_len = response.len(),
            "Model response was not JSON, retrying once"
        );
        let retry_response = self.chat.complete(SYSTEM_PROMPT, &user_prompt)?;
        if let Some(object) = extract_json_from_text(&retry_response) {
            return Ok(StructuredOutcome::Structured(object));
        }

        tracing::error!("Model response was not JSON after retry");
        Ok(StructuredOutcome::Fallback(FallbackPayload {
            raw_text: ocr_text.to_string(),
            structured_data: retry_response,
            error: FALLBACK_ERROR.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::structuring::client::MockChatClient;

    #[test]
    fn first_response_parses() {
        let chat = Arc::new(MockChatClient::constant(r#"{"Name": "Alice"}"#));
        let structurer = Structurer::new(chat.clone());

        let outcome = structurer.structure_text("Name: Alice").unwrap();
        let StructuredOutcome::Structured(object) = outcome else {
            panic!("expected structured outcome");
        };
        assert_eq!(object["Name"], "Alice");
        assert_eq!(chat.calls(), 1);
    }

    #[test]
    fn retry_recovers_from_prose_response() {
        let chat = Arc::new(MockChatClient::new(vec![
            Ok("Sorry, I can only reply in prose.".into()),
            Ok(r#"{"Name": "Bob"}"#.into()),
        ]));
        let structurer = Structurer::new(chat.clone());

        let outcome = structurer.structure_text("Name: Bob").unwrap();
        assert!(matches!(outcome, StructuredOutcome::Structured(_)));
        assert_eq!(chat.calls(), 2);
    }

    #[test]
    fn two_prose_responses_become_fallback() {
        let chat = Arc::new(MockChatClient::constant("still not json"));
        let structurer = Structurer::new(chat.clone());

        let outcome = structurer.structure_text("some ocr text").unwrap();
        let StructuredOutcome::Fallback(payload) = outcome else {
            panic!("expected fallback");
        };
        assert_eq!(payload.raw_text, "some ocr text");
        assert_eq!(payload.structured_data, "still not json");
        assert_eq!(payload.error, "Response was not in JSON format");
        assert_eq!(chat.calls(), 2);
    }

    #[test]
    fn transport_error_propagates() {
        let chat = Arc::new(MockChatClient::new(vec![Err("connection refused".into())]));
        let structurer = Structurer::new(chat);

        assert!(structurer.structure_text("text").is_err());
    }

    #[test]
    fn transport_error_on_retry_propagates() {
        let chat = Arc::new(MockChatClient::new(vec![
            Ok("not json".into()),
            Err("connection reset".into()),
        ]));
        let structurer = Structurer::new(chat.clone());

        assert!(structurer.structure_text("text").is_err());
        assert_eq!(chat.calls(), 2);
    }
}
