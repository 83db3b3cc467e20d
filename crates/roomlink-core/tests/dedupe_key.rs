//! Dedupe key stability across decoded frames.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use chrono::{DateTime, FixedOffset};

use roomlink_core::protocol::decode_frame_at;
use roomlink_core::ChatMessage;

fn decode(raw: &str, at: DateTime<FixedOffset>) -> ChatMessage {
    decode_frame_at(raw.as_bytes(), "room-1", at)
        .into_message()
        .expect("chat frame")
}

fn t(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap()
}

#[test]
fn id_takes_precedence_over_body() {
    let now = t("2025-01-01T00:00:00Z");
    let a = decode(r#"{"id":"7","sender":"alice","content":"one"}"#, now);
    let b = decode(r#"{"id":"7","sender":"bob","content":"two"}"#, now);
    assert_eq!(a.dedupe_key(), b.dedupe_key());
}

#[test]
fn identical_anonymous_frames_collapse() {
    let now = t("2025-01-01T00:00:00Z");
    let raw = r#"{"sender":"alice","content":"same","createdAt":"2025-01-01T00:00:00Z"}"#;
    assert_eq!(decode(raw, now).dedupe_key(), decode(raw, now).dedupe_key());
}

#[test]
fn plain_text_redelivered_later_is_distinct() {
    // Bare-text frames are stamped at decode time, so the same text arriving
    // at a different instant is a new message.
    let a = decode("hello", t("2025-01-01T00:00:00Z"));
    let b = decode("hello", t("2025-01-01T00:00:01Z"));
    assert_ne!(a.dedupe_key(), b.dedupe_key());
}

#[test]
fn equal_instants_in_different_offsets_share_a_key() {
    let now = t("2025-01-01T00:00:00Z");
    let a = decode(r#"{"content":"x","createdAt":"2025-01-01T09:00:00+09:00"}"#, now);
    let b = decode(r#"{"content":"x","createdAt":"2025-01-01T00:00:00Z"}"#, now);
    assert_eq!(a.dedupe_key(), b.dedupe_key());
}

#[test]
fn pipes_inside_fields_keep_messages_apart() {
    let now = t("2025-01-01T00:00:00Z");
    let a = decode_frame_at(br#"{"sender":"s|","content":"c"}"#, "r", now)
        .into_message()
        .expect("chat frame");
    let b = decode_frame_at(br#"{"sender":"s","content":"|c"}"#, "r", now)
        .into_message()
        .expect("chat frame");
    assert_ne!(a.dedupe_key(), b.dedupe_key());
}
