//! Dedupe fingerprints.
//!
//! A message with a server id is keyed by `room:id`. Anonymous messages are
//! keyed by a SHA-256 digest over length-prefixed room, sender, creation time
//! and content, so two of them collapse only when all four fields match exactly.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::model::ChatMessage;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupeKey(String);

impl DedupeKey {
    pub fn new(
        room_id: &str,
        id: Option<&str>,
        sender: &str,
        created_at_ms: Option<i64>,
        content: &str,
    ) -> Self {
        if let Some(id) = id.filter(|id| !id.trim().is_empty()) {
            return Self(format!("{room_id}:{id}"));
        }

        let created = created_at_ms.map(|ms| ms.to_string()).unwrap_or_default();
        let mut hasher = Sha256::new();
        for field in [room_id, sender, created.as_str(), content] {
            // length prefix keeps field boundaries unambiguous
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn for_message(msg: &ChatMessage) -> Self {
        Self::new(
            &msg.room_id,
            msg.id.as_deref(),
            &msg.sender,
            msg.created_at_millis(),
            &msg.content,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DedupeKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
