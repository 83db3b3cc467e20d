//! Inbound frame decoding (panic-free).
//!
//! Decoding rules:
//! - JSON object with a `content` field => chat message (missing fields defaulted).
//! - JSON that is not such an object (`{"type":"ping"}`, `42`) => ignored.
//! - Anything that is not JSON => bare-text chat message stamped with the
//!   receive time.
//!
//! A frame never produces an error; the worst case is the plain-text fallback.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::model::{ChatMessage, UNKNOWN_SENDER};

const KEY_ID: &str = "id";
const KEY_ROOM: &str = "roomId";
const KEY_SENDER: &str = "sender";
const KEY_CONTENT: &str = "content";
const KEY_CREATED_AT: &str = "createdAt";

/// Result of decoding one logical message.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Accepted chat message.
    Chat(ChatMessage),
    /// Structured payload that is not a chat message (control, ping, empty).
    Ignored,
}

impl Decoded {
    pub fn into_message(self) -> Option<ChatMessage> {
        match self {
            Decoded::Chat(msg) => Some(msg),
            Decoded::Ignored => None,
        }
    }
}

/// Decode a raw frame, stamping bare-text frames with the current time.
pub fn decode_frame(raw: &[u8], fallback_room_id: &str) -> Decoded {
    decode_frame_at(raw, fallback_room_id, Utc::now().into())
}

/// Decode a raw frame with an explicit receive time.
pub fn decode_frame_at(raw: &[u8], fallback_room_id: &str, now: DateTime<FixedOffset>) -> Decoded {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.is_empty() {
        return Decoded::Ignored;
    }

    let root: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return Decoded::Chat(ChatMessage::plain_text(fallback_room_id, text, now)),
    };

    let Value::Object(obj) = root else {
        return Decoded::Ignored;
    };
    if !obj.contains_key(KEY_CONTENT) {
        return Decoded::Ignored;
    }

    match structured(obj, fallback_room_id) {
        Some(msg) => Decoded::Chat(msg),
        None => {
            tracing::debug!(room = %fallback_room_id, "mistyped chat fields; treating frame as text");
            Decoded::Chat(ChatMessage::plain_text(fallback_room_id, text, now))
        }
    }
}

/// Build a message from a JSON object. `None` when a string field carries
/// another JSON type.
fn structured(mut obj: Map<String, Value>, fallback_room_id: &str) -> Option<ChatMessage> {
    let content = opt_string(obj.remove(KEY_CONTENT))?.unwrap_or_default();
    let room_id = opt_string(obj.remove(KEY_ROOM))?.unwrap_or_else(|| fallback_room_id.to_string());
    let sender = opt_string(obj.remove(KEY_SENDER))?.unwrap_or_else(|| UNKNOWN_SENDER.to_string());
    let id = match obj.remove(KEY_ID) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let created_at = match obj.remove(KEY_CREATED_AT) {
        Some(Value::String(s)) => parse_timestamp(&s),
        _ => None,
    };

    Some(ChatMessage {
        id,
        room_id,
        sender,
        content,
        created_at,
        extra: obj,
    })
}

/// `Some(None)` for absent/null, `Some(Some(s))` for strings, `None` otherwise.
fn opt_string(v: Option<Value>) -> Option<Option<String>> {
    match v {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s)),
        Some(_) => None,
    }
}

/// RFC 3339 first, then offsets written without a colon (`+0900`). Naive
/// date-times and bare dates are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t);
    }
    if let Some(t) = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"]
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    {
        return Some(t);
    }
    if let Some(naive) = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(naive.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}
