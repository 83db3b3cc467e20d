//! roomlink core: wire model, frame decoding, and dedupe fingerprints.
//!
//! This crate defines the chat message model, the tolerant frame decoder, the
//! stable dedupe key, and the error surface shared by the client and facade
//! crates. It carries no transport or runtime dependencies so the decoding
//! rules can be exercised in isolation.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed frames never surface as panics: the decoder falls back to a
//! plain-text interpretation or reports the frame as ignored.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, Result, RoomLinkError};
pub use model::{ChatMessage, UNKNOWN_SENDER};
pub use protocol::{decode_frame, decode_frame_at, Decoded, DedupeKey};
