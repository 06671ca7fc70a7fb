//! Tolerant JSON extraction from free-form model output.
//!
//! Models asked for "ONLY valid JSON" still wrap answers in prose or code
//! fences often enough that four increasingly permissive strategies are
//! tried in order:
//!
//! 1. the whole response parses as a JSON object;
//! 2. a ```json fenced block;
//! 3. a brace-delimited substring inside any fenced block;
//! 4. the first `{` .. last `}` substring of the whole text.
//!
//! Only objects count. Arrays and scalars are never accepted, even when they
//! parse — the storage layer needs key/value rows.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?(\{.*?\}).*?```").unwrap());

pub fn extract_json_from_text(text: &str) -> Option<Map<String, Value>> {
    if text.trim().is_empty() {
        return None;
    }

    // 1. Pure JSON response
    if let Some(object) = parse_object(text) {
        return Some(object);
    }

    // 2. ```json fenced block
    if let Some(caps) = FENCED_JSON.captures(text) {
        if let Some(object) = caps.get(1).and_then(|m| parse_object(m.as_str())) {
            return Some(object);
        }
    }

    // 3. Braces inside any fenced block
    if let Some(caps) = ANY_FENCE.captures(text) {
        if let Some(object) = caps.get(1).and_then(|m| parse_object(m.as_str())) {
            return Some(object);
        }
    }

    // 4. First '{' to last '}' anywhere in the text
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        return parse_object(&text[start..=end]);
    }
    None
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
