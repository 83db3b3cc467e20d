use std::time::Duration;

use tokio::sync::mpsc;

use roomlink_core::ChatMessage;

/// One subscriber's bounded queue, in strict receipt order. The channel waits
/// for room in every open queue before reading the next frame; dropping the
/// stream unsubscribes.
pub type MessageStream = mpsc::Receiver<ChatMessage>;

/// Lifecycle of a realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    /// No room requested yet.
    #[default]
    Idle,
    /// Handshake in flight.
    Connecting { room: String, attempt: u32 },
    /// Receiving frames.
    Open { room: String },
    /// Transport torn down, waiting `delay` before the next attempt.
    Reconnecting {
        room: String,
        attempt: u32,
        delay: Duration,
    },
    /// Stopped by the caller; terminal until a room is requested again.
    Closed,
}

impl ChannelState {
    pub fn room(&self) -> Option<&str> {
        match self {
            ChannelState::Connecting { room, .. }
            | ChannelState::Open { room }
            | ChannelState::Reconnecting { room, .. } => Some(room),
            ChannelState::Idle | ChannelState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Idle => "idle",
            ChannelState::Connecting { .. } => "connecting",
            ChannelState::Open { .. } => "open",
            ChannelState::Reconnecting { .. } => "reconnecting",
            ChannelState::Closed => "closed",
        }
    }
}
