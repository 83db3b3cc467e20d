//! Chat message model.
//!
//! Field names follow the wire format (`roomId`, `createdAt`). Fields the
//! client does not know about are kept in `extra` and written back out when the
//! message is serialized again.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::DedupeKey;

/// Sender recorded when a frame does not name one.
pub const UNKNOWN_SENDER: &str = "unknown";

/// One chat message as delivered by the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned identifier. Absent for bare-text frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub room_id: String,
    #[serde(default = "default_sender")]
    pub sender: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<FixedOffset>>,
    /// Unknown wire fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_sender() -> String {
    UNKNOWN_SENDER.to_string()
}

impl ChatMessage {
    /// Message built from a bare-text frame.
    pub fn plain_text(
        room_id: impl Into<String>,
        content: impl Into<String>,
        received_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: None,
            room_id: room_id.into(),
            sender: default_sender(),
            content: content.into(),
            created_at: Some(received_at),
            extra: Map::new(),
        }
    }

    /// `createdAt` as milliseconds since the Unix epoch.
    pub fn created_at_millis(&self) -> Option<i64> {
        self.created_at.map(|t| t.timestamp_millis())
    }

    /// Identifier if present and not blank.
    pub fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Stable fingerprint used to drop redeliveries.
    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey::for_message(self)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn serializes_wire_names_and_extras() {
        let mut msg = ChatMessage::plain_text(
            "lobby",
            "hi",
            DateTime::parse_from_rfc3339("2024-05-01T10:00:00+09:00").unwrap(),
        );
        msg.extra.insert("edited".into(), Value::Bool(true));

        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["roomId"], "lobby");
        assert_eq!(v["sender"], UNKNOWN_SENDER);
        assert_eq!(v["edited"], true);
        assert!(v.get("id").is_none());
        assert!(v["createdAt"].as_str().unwrap().starts_with("2024-05-01T10:00:00"));
    }

    #[test]
    fn blank_id_is_not_explicit() {
        let mut msg = ChatMessage::plain_text("r", "x", chrono::Utc::now().into());
        msg.id = Some("   ".into());
        assert!(msg.explicit_id().is_none());
        msg.id = Some("42".into());
        assert_eq!(msg.explicit_id(), Some("42"));
    }
}
