//! Remote Read API OCR client.
//!
//! Two-phase protocol: POST the image bytes to the analyze endpoint, then
//! poll the returned `Operation-Location` URL until the analysis finishes.
//! Polling is a fixed cadence — 15 attempts, one second apart — after which
//! the page is treated as timed out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;

use super::types::OcrEngine;
use super::ExtractionError;

const READ_ANALYZE_PATH: &str = "/vision/v3.2/read/analyze";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPERATION_LOCATION_HEADER: &str = "Operation-Location";

const MAX_POLL_ATTEMPTS: u32 = 15;
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Terminal and non-terminal states of a Read operation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReadStatus {
    Succeeded,
    Failed,
    Pending,
}

/// Production OCR engine backed by the remote Read API.
pub struct ReadApiClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
    poll_interval: Duration,
}

impl ReadApiClient {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, ExtractionError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExtractionError::OcrRequest(format!("HTTP client init: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Submit the image and return the operation URL to poll.
    fn submit(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let url = format!("{}{READ_ANALYZE_PATH}", self.endpoint);
        let response = self
            .http
            .post(&url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .map_err(|e| ExtractionError::OcrRequest(format!("Submit failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractionError::OcrRequest(format!(
                "Submit returned {status}: {body}"
            )));
        }

        response
            .headers()
            .get(OPERATION_LOCATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or(ExtractionError::MissingOperationLocation)
    }

    /// Poll the operation URL until it reaches a terminal state.
    fn poll(&self, operation_url: &str) -> Result<String, ExtractionError> {
        poll_until_terminal(self.poll_interval, |_attempt| {
            let response = self
                .http
                .get(operation_url)
                .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
                .send()
                .map_err(|e| ExtractionError::OcrRequest(format!("Poll failed: {e}")))?;

            response
                .json()
                .map_err(|e| ExtractionError::OcrRequest(format!("Poll body: {e}")))
        })
    }
}

/// Drive the polling cadence over any transport: sleep, fetch the operation
/// body, stop on a terminal status, time out after the attempt budget.
fn poll_until_terminal(
    interval: Duration,
    mut fetch: impl FnMut(u32) -> Result<Value, ExtractionError>,
) -> Result<String, ExtractionError> {
    for attempt in 1..=MAX_POLL_ATTEMPTS {
        std::thread::sleep(interval);

        let body = fetch(attempt)?;
        match parse_read_status(&body) {
            ReadStatus::Succeeded => return Ok(collect_line_text(&body)),
            ReadStatus::Failed => {
                return Err(ExtractionError::OcrFailed(body.to_string()));
            }
            ReadStatus::Pending => {
                tracing::trace!(attempt, max = MAX_POLL_ATTEMPTS, "OCR still running");
            }
        }
    }
    Err(ExtractionError::OcrTimeout(MAX_POLL_ATTEMPTS))
}

impl OcrEngine for ReadApiClient {
    fn extract_text(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let _span =
            tracing::info_span!("ocr_extract", image_size = image_bytes.len()).entered();
        let start = std::time::Instant::now();

        let operation_url = self.submit(image_bytes)?;
        let text = self.poll(&operation_url)?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            text_len = text.len(),
            "OCR extraction complete"
        );
        Ok(text)
    }
}

/// Map the poll response's `status` field to a `ReadStatus`.
///
/// Unknown or absent statuses count as pending so a transient oddity does not
/// abort the page before the attempt budget runs out.
fn parse_read_status(body: &Value) -> ReadStatus {
    match body.get("status").and_then(Value::as_str) {
        Some("succeeded") => ReadStatus::Succeeded,
        Some("failed") => ReadStatus::Failed,
        _ => ReadStatus::Pending,
    }
}

/// Concatenate `analyzeResult.readResults[].lines[].text` with newlines.
fn collect_line_text(body: &Value) -> String {
    let mut lines = Vec::new();
    if let Some(results) = body
        .pointer("/analyzeResult/readResults")
        .and_then(Value::as_array)
    {
        for result in results {
            if let Some(page_lines) = result.get("lines").and_then(Value::as_array) {
                for line in page_lines {
                    if let Some(text) = line.get("text").and_then(Value::as_str) {
                        lines.push(text);
                    }
                }
            }
        }
    }
    lines.join("\n")
}

// ──────────────────────────────────────────────
// MockOcrEngine (testing)
// ──────────────────────────────────────────────

/// Mock OCR engine returning scripted page texts.
///
/// Each call pops the next response; an `Err` script entry surfaces as an
/// `OcrFailed` error. Call count is observable for sequencing assertions.
pub struct MockOcrEngine {
    responses: Vec<Result<String, String>>,
    calls: AtomicUsize,
}

impl MockOcrEngine {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses,
            calls: AtomicUsize::new(0),
        }
    }

    /// Engine that returns the same text on every call.
    pub fn constant(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for MockOcrEngine {
    fn extract_text(&self, _image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.responses.len().saturating_sub(1));
        match self.responses.get(index) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(message)) => Err(ExtractionError::OcrFailed(message.clone())),
            None => Err(ExtractionError::OcrFailed("no scripted response".into())),
        }
    }
}
