//! Shared error type across roomlink crates.

use thiserror::Error;

/// Stable error classification (safe to log or match on).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Configuration rejected.
    InvalidConfig,
    /// Endpoint address could not be built.
    InvalidAddress,
    /// Transport handshake failed.
    ConnectFailed,
    /// Mid-stream transport I/O error.
    Transport,
    /// Server-initiated close.
    ClosedByPeer,
    /// Bounded wait elapsed.
    Timeout,
    /// Unexpected internal state.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::InvalidAddress => "INVALID_ADDRESS",
            ErrorCode::ConnectFailed => "CONNECT_FAILED",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::ClosedByPeer => "CLOSED_BY_PEER",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Internal => "INTERNAL",
        }
    }

    /// Whether the realtime loop recovers from this class by reconnecting.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorCode::ConnectFailed
                | ErrorCode::Transport
                | ErrorCode::ClosedByPeer
                | ErrorCode::Timeout
        )
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RoomLinkError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum RoomLinkError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("closed by peer: {0}")]
    ClosedByPeer(String),
    #[error("timed out")]
    Timeout,
    #[error("internal: {0}")]
    Internal(String),
}

impl RoomLinkError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RoomLinkError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            RoomLinkError::InvalidAddress(_) => ErrorCode::InvalidAddress,
            RoomLinkError::Connect(_) => ErrorCode::ConnectFailed,
            RoomLinkError::Transport(_) => ErrorCode::Transport,
            RoomLinkError::ClosedByPeer(_) => ErrorCode::ClosedByPeer,
            RoomLinkError::Timeout => ErrorCode::Timeout,
            RoomLinkError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.code().is_transient()
    }
}
