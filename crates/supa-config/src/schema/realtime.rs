//! Realtime connection settings.

use serde::{Deserialize, Serialize};

/// Realtime socket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// Use `wss` instead of `ws`.
    pub secure: bool,
    /// Seconds between heartbeats (1-300).
    pub heartbeat_interval_secs: u64,
    /// Full websocket URL; replaces the URL derived from `project.host`.
    pub custom_url: Option<String>,
    /// Seconds to wait for the socket to open (1-120).
    pub connect_timeout_secs: u64,
    /// Seconds to wait for a join or leave reply (1-120).
    pub join_timeout_secs: u64,
    pub websocket: WebSocketSettings,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            secure: true,
            heartbeat_interval_secs: 10,
            custom_url: None,
            connect_timeout_secs: 15,
            join_timeout_secs: 10,
            websocket: WebSocketSettings::default(),
        }
    }
}

/// Options passed to the websocket handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketSettings {
    /// Values offered in `Sec-WebSocket-Protocol`.
    pub subprotocols: Vec<String>,
    /// Largest inbound message accepted, in bytes.
    pub max_message_size: Option<usize>,
}
