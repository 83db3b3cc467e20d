//! roomlink client library entry.
//!
//! This crate wires the transport, realtime channel, notification gating and
//! metrics into a reconnecting chat room client. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod notify;
pub mod obs;
pub mod realtime;
pub mod transport;
