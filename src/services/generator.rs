// src/services/generator.rs
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GeminiConfig;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("response blocked (finish reason {0})")]
    Blocked(String),
}

/// Anything that turns a prompt into a complete reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Google Gemini `streamGenerateContent` adapter. The SSE stream is folded
/// into one string before returning.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerateError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self { client: builder.build()?, config })
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model,
            api_key
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let api_key = self.config.api_key.as_deref().ok_or(GenerateError::MissingApiKey)?;

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }]
        });

        debug!(model = %self.config.model, "sending prompt to Gemini");
        // The key travels in the query string; keep it out of error messages.
        let response = self
            .client
            .post(self.endpoint(api_key))
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let mut acc = SseAccumulator::default();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            acc.feed(&chunk.map_err(reqwest::Error::without_url)?)?;
        }
        acc.finish()
    }
}

/// Pull the human-readable message out of a Gemini error body, falling back to
/// the raw (truncated) text.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Incremental parser for the `alt=sse` body: `data: {json}` lines separated by
/// blank lines. Chunks may split lines anywhere.
#[derive(Default)]
struct SseAccumulator {
    buffer: Vec<u8>,
    text: String,
    finish_reason: Option<String>,
}

impl SseAccumulator {
    fn feed(&mut self, bytes: &[u8]) -> Result<(), GenerateError> {
        self.buffer.extend_from_slice(bytes);
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.handle_line(line.trim())?;
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Result<(), GenerateError> {
        let Some(data) = line.strip_prefix("data:") else {
            return Ok(());
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return Ok(());
        }

        let value: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(err) => {
                warn!(%err, "skipping malformed SSE event");
                return Ok(());
            }
        };

        if let Some(err) = value.get("error") {
            return Err(GenerateError::Api {
                status: err["code"]
                    .as_u64()
                    .and_then(|code| u16::try_from(code).ok())
                    .unwrap_or(500),
                message: err["message"].as_str().unwrap_or("unknown error").to_string(),
            });
        }

        for candidate in value["candidates"].as_array().into_iter().flatten() {
            if let Some(reason) = candidate["finishReason"].as_str() {
                self.finish_reason = Some(reason.to_string());
            }
            for part in candidate["content"]["parts"].as_array().into_iter().flatten() {
                if let Some(text) = part["text"].as_str() {
                    self.text.push_str(text);
                }
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<String, GenerateError> {
        // A final event without a trailing newline.
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.handle_line(String::from_utf8_lossy(&rest).trim())?;
        }
        match self.finish_reason {
            Some(reason) if self.text.is_empty() && reason != "STOP" => {
                Err(GenerateError::Blocked(reason))
            }
            _ => Ok(self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> String {
        format!(
            "data: {}\r\n\r\n",
            json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
        )
    }

    #[test]
    fn concatenates_parts_across_events() {
        let mut acc = SseAccumulator::default();
        acc.feed(event("Hello, ").as_bytes()).unwrap();
        acc.feed(event("world").as_bytes()).unwrap();
        assert_eq!(acc.finish().unwrap(), "Hello, world");
    }

    #[test]
    fn handles_lines_split_between_chunks() {
        let body = event("split me");
        let (a, b) = body.split_at(17);
        let mut acc = SseAccumulator::default();
        acc.feed(a.as_bytes()).unwrap();
        acc.feed(b.as_bytes()).unwrap();
        assert_eq!(acc.finish().unwrap(), "split me");
    }

    #[test]
    fn final_event_without_newline() {
        let body = event("tail");
        let mut acc = SseAccumulator::default();
        acc.feed(body.trim_end().as_bytes()).unwrap();
        assert_eq!(acc.finish().unwrap(), "tail");
    }

    #[test]
    fn error_event_fails() {
        let mut acc = SseAccumulator::default();
        let err = acc
            .feed(b"data: {\"error\": {\"code\": 429, \"message\": \"quota\"}}\n")
            .unwrap_err();
        assert!(matches!(err, GenerateError::Api { status: 429, .. }));
    }

    #[test]
    fn out_of_range_error_code_falls_back_to_500() {
        let mut acc = SseAccumulator::default();
        let err = acc
            .feed(b"data: {\"error\": {\"code\": 70000, \"message\": \"odd\"}}\n")
            .unwrap_err();
        assert!(matches!(err, GenerateError::Api { status: 500, .. }));
    }

    #[test]
    fn empty_safety_stop_is_blocked() {
        let mut acc = SseAccumulator::default();
        acc.feed(b"data: {\"candidates\": [{\"finishReason\": \"SAFETY\"}]}\n\n")
            .unwrap();
        assert!(matches!(acc.finish(), Err(GenerateError::Blocked(r)) if r == "SAFETY"));
    }

    #[test]
    fn extracts_api_error_message() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid"}}"#;
        assert_eq!(api_error_message(body), "API key not valid");
        assert_eq!(api_error_message("plain"), "plain");
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, GenerateError::MissingApiKey));
    }
}
