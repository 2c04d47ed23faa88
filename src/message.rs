// src/message.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Sender name used for every reply produced by the model.
pub const BOT_SENDER: &str = "AI BOT";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub text: String,
    /// RFC 3339, UTC, millisecond precision (`2024-05-01T12:00:00.000Z`).
    pub timestamp: String,
}

impl Message {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self::at(sender, text, Utc::now())
    }

    pub fn at(sender: impl Into<String>, text: impl Into<String>, when: DateTime<Utc>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            timestamp: when.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(BOT_SENDER, text)
    }

    pub fn is_from_bot(&self) -> bool {
        self.sender == BOT_SENDER
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

// Request bodies keep every field optional so that a missing field is a
// validation error (400) rather than a deserialization rejection.

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NicknameRequest {
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StatusResponse {
    pub message: String,
}

impl StatusResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_is_iso_with_millis() {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let msg = Message::at("alice", "hi", when);
        assert_eq!(msg.timestamp, "2024-05-01T12:00:00.000Z");
        assert_eq!(msg.parsed_timestamp(), Some(when));
    }

    #[test]
    fn bot_messages_use_fixed_sender() {
        let msg = Message::bot("hello");
        assert_eq!(msg.sender, "AI BOT");
        assert!(msg.is_from_bot());
        assert!(msg.parsed_timestamp().is_some());
    }

    #[test]
    fn missing_request_fields_deserialize_as_none() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"sender":"alice"}"#).unwrap();
        assert_eq!(req.sender.as_deref(), Some("alice"));
        assert!(req.text.is_none());
    }
}
