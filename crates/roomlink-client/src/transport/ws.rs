//! WebSocket transport (tokio-tungstenite).
//!
//! Responsibilities:
//! - Client handshake against the room address
//! - Keepalive ping on a fixed interval while the socket is idle
//! - Surface Text/Binary/Close as segments, swallow Ping/Pong
//! - Close handshake on request, draining until the peer acknowledges

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use roomlink_core::error::{Result, RoomLinkError};

use super::codec;
use super::{Connector, Segment, Transport, TransportState};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens one [`WsTransport`] per connection attempt.
#[derive(Debug, Clone)]
pub struct WsConnector {
    keepalive: Duration,
}

impl WsConnector {
    pub fn new(keepalive: Duration) -> Self {
        Self { keepalive }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>> {
        let (stream, _resp) = connect_async(url)
            .await
            .map_err(|e| RoomLinkError::Connect(format!("websocket handshake failed: {e}")))?;
        Ok(Box::new(WsTransport::new(stream, self.keepalive)))
    }
}

pub struct WsTransport {
    stream: WsStream,
    keepalive: Interval,
    state: TransportState,
}

impl WsTransport {
    fn new(stream: WsStream, every: Duration) -> Self {
        let mut keepalive = interval_at(Instant::now() + every, every);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            stream,
            keepalive,
            state: TransportState::Open,
        }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn recv(&mut self) -> Result<Option<Segment>> {
        loop {
            tokio::select! {
                _ = self.keepalive.tick() => {
                    if let Err(e) = self.stream.send(Message::Ping(Vec::new())).await {
                        self.state = TransportState::Closed;
                        return Err(RoomLinkError::Transport(format!("keepalive ping failed: {e}")));
                    }
                }

                incoming = self.stream.next() => {
                    let msg = match incoming {
                        None => {
                            self.state = TransportState::Closed;
                            return Ok(None);
                        }
                        Some(Err(e)) => {
                            self.state = TransportState::Closed;
                            return Err(RoomLinkError::Transport(e.to_string()));
                        }
                        Some(Ok(msg)) => msg,
                    };

                    // any inbound traffic proves liveness
                    self.keepalive.reset();

                    match codec::segment(msg) {
                        Some(seg @ Segment::Close { .. }) => {
                            self.state = TransportState::Closing;
                            return Ok(Some(seg));
                        }
                        Some(seg) => return Ok(Some(seg)),
                        None => continue,
                    }
                }
            }
        }
    }

    async fn close(&mut self, reason: &str) -> Result<()> {
        if self.state == TransportState::Closed {
            return Ok(());
        }
        self.state = TransportState::Closing;

        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: Cow::Owned(reason.to_string()),
        };
        let sent = self.stream.close(Some(frame)).await;

        // wait for the peer's close frame / EOF
        while let Some(Ok(_)) = self.stream.next().await {}
        self.state = TransportState::Closed;

        sent.map_err(|e| RoomLinkError::Transport(format!("close handshake failed: {e}")))
    }

    fn state(&self) -> TransportState {
        self.state
    }
}
