//! Protocol modules (frame decoding + dedupe keys).
//!
//! Inbound frames are UTF-8 text. Structured frames are JSON objects; anything
//! else is accepted as a bare-text chat message. Both modules are panic-free so
//! a hostile or buggy server cannot take the client loop down.

pub mod decode;
pub mod key;

pub use decode::{decode_frame, decode_frame_at, parse_timestamp, Decoded};
pub use key::DedupeKey;
