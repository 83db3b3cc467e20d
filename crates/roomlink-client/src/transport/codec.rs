//! Segment codec for the transport layer.
//!
//! - WS Text/Binary => `Segment::Text` (tungstenite already joins continuation frames)
//! - WS Close => `Segment::Close`
//! - Ping/Pong are lifecycle noise and never reach the channel
//!
//! `MessageAssembler` joins segments into one logical message, bounded by
//! `max_bytes`. An oversized message is discarded up to its final segment.

use bytes::{Bytes, BytesMut};
use tokio_tungstenite::tungstenite::Message;

use super::Segment;

pub fn segment(msg: Message) -> Option<Segment> {
    match msg {
        Message::Text(s) => Some(Segment::text(s)),
        Message::Binary(b) => Some(Segment::text(b)),
        Message::Close(frame) => Some(Segment::Close {
            reason: frame.map(|f| f.reason.into_owned()).unwrap_or_default(),
        }),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

/// Outcome of feeding one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembled {
    /// Waiting for more segments.
    Pending,
    /// A full logical message.
    Complete(Bytes),
    /// The message exceeded the limit and was dropped.
    Oversized { len: usize },
}

#[derive(Debug)]
pub struct MessageAssembler {
    buf: BytesMut,
    max_bytes: usize,
    len: usize,
    overflowed: bool,
}

impl MessageAssembler {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_bytes,
            len: 0,
            overflowed: false,
        }
    }

    pub fn push(&mut self, data: &[u8], fin: bool) -> Assembled {
        self.len = self.len.saturating_add(data.len());
        if self.len > self.max_bytes {
            self.overflowed = true;
            self.buf.clear();
        } else {
            self.buf.extend_from_slice(data);
        }

        if !fin {
            return Assembled::Pending;
        }

        let out = if self.overflowed {
            Assembled::Oversized { len: self.len }
        } else {
            Assembled::Complete(self.buf.split().freeze())
        };
        self.reset();
        out
    }

    /// Drop any partial message (used when the transport is torn down).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.len = 0;
        self.overflowed = false;
    }

    pub fn is_partial(&self) -> bool {
        self.len > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;

    #[test]
    fn joins_fragments_until_fin() {
        let mut a = MessageAssembler::new(64);
        assert_eq!(a.push(b"{\"content\":", false), Assembled::Pending);
        assert!(a.is_partial());
        assert_eq!(a.push(b"\"hi\"", false), Assembled::Pending);
        assert_eq!(
            a.push(b"}", true),
            Assembled::Complete(Bytes::from_static(b"{\"content\":\"hi\"}"))
        );
        assert!(!a.is_partial());
    }

    #[test]
    fn oversized_message_is_dropped_whole() {
        let mut a = MessageAssembler::new(8);
        assert_eq!(a.push(b"12345", false), Assembled::Pending);
        assert_eq!(a.push(b"67890", false), Assembled::Pending);
        assert_eq!(a.push(b"x", true), Assembled::Oversized { len: 11 });
        // next message starts clean
        assert_eq!(a.push(b"ok", true), Assembled::Complete(Bytes::from_static(b"ok")));
    }

    #[test]
    fn maps_ws_messages() {
        assert_eq!(
            segment(Message::Text("hi".into())),
            Some(Segment::text("hi"))
        );
        assert_eq!(segment(Message::Ping(vec![1])), None);
        let close = Message::Close(Some(CloseFrame {
            code: CloseCode::Away,
            reason: "restart".into(),
        }));
        assert_eq!(
            segment(close),
            Some(Segment::Close {
                reason: "restart".into()
            })
        );
    }
}
