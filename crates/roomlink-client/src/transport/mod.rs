//! Transport layer (client WebSocket).
//!
//! The realtime channel only talks to the [`Connector`] / [`Transport`] traits;
//! `ws` provides the tokio-tungstenite implementation and tests plug in
//! scripted transports. `codec` reassembles wire segments into logical
//! messages and `endpoint` builds the room address.

use async_trait::async_trait;
use bytes::Bytes;

use roomlink_core::error::Result;

pub mod codec;
pub mod endpoint;
pub mod ws;

pub use codec::{Assembled, MessageAssembler};
pub use endpoint::{escape_component, Endpoint};
pub use ws::{WsConnector, WsTransport};

/// Connection state as reported by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// One wire-level unit read from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// UTF-8 payload; `fin` marks the end of a logical message.
    Text { data: Bytes, fin: bool },
    /// Peer started the close handshake.
    Close { reason: String },
}

impl Segment {
    /// Complete single-segment text message.
    pub fn text(data: impl Into<Bytes>) -> Self {
        Segment::Text {
            data: data.into(),
            fin: true,
        }
    }
}

/// Duplex streaming connection owned by the realtime loop.
#[async_trait]
pub trait Transport: Send {
    /// Next segment. `Ok(None)` means the stream ended without a close frame.
    async fn recv(&mut self) -> Result<Option<Segment>>;

    /// Start the close handshake and wait for the peer. Callers bound this
    /// with a timeout.
    async fn close(&mut self, reason: &str) -> Result<()>;

    fn state(&self) -> TransportState;
}

/// Factory for transports, one per connection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>>;
}
