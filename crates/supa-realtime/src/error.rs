use std::time::Duration;

use supa_common::SupaError;

/// Errors produced by the realtime layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    /// `connect()` was called while the socket is already connected.
    #[error("websocket already connected")]
    AlreadyConnected,

    /// A send was attempted with no open socket.
    #[error("websocket is not connected")]
    NotConnected,

    /// An inbound frame could not be decoded into a message envelope.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The previous heartbeat was still unanswered on the next tick.
    #[error("heartbeat {heartbeat_ref} was not acknowledged within one interval")]
    HeartbeatTimeout { heartbeat_ref: u64 },

    /// The server rejected a join, or did not answer in time.
    #[error("failed to join channel {topic}: {reason}")]
    ChannelJoin { topic: String, reason: String },

    #[error("connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, RealtimeError>;

impl From<RealtimeError> for SupaError {
    fn from(err: RealtimeError) -> Self {
        SupaError::Realtime(err.to_string())
    }
}
