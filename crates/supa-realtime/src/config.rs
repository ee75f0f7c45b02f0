//! Runtime configuration for the realtime client.

use std::time::Duration;

/// Configuration for connecting to the realtime endpoint.
#[derive(Clone)]
pub struct RealtimeConfig {
    /// Backend host without scheme (e.g., "abcdefgh.supabase.co").
    pub host: String,
    /// Publishable API key, sent as the `apikey` query parameter.
    pub api_key: String,
    /// Use `wss` (default) instead of `ws`.
    pub secure: bool,
    /// Time between heartbeats; an unanswered heartbeat times out after one interval.
    pub heartbeat_interval: Duration,
    /// Replaces the URL derived from `host`, `secure` and `api_key`.
    pub custom_url: Option<String>,
    /// Upper bound on opening the socket.
    pub connect_timeout: Duration,
    /// Upper bound on waiting for a join or leave reply.
    pub join_timeout: Duration,
    pub websocket: WebSocketOptions,
}

/// Options applied to the websocket handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebSocketOptions {
    /// Offered in the `Sec-WebSocket-Protocol` header.
    pub subprotocols: Vec<String>,
    /// Largest inbound message accepted, in bytes.
    pub max_message_size: Option<usize>,
}

impl std::fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("host", &self.host)
            .field("api_key", &"[REDACTED]")
            .field("secure", &self.secure)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field(
                "custom_url",
                &self.custom_url.as_deref().map(strip_query),
            )
            .field("connect_timeout", &self.connect_timeout)
            .field("join_timeout", &self.join_timeout)
            .field("websocket", &self.websocket)
            .finish()
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            api_key: String::new(),
            secure: true,
            heartbeat_interval: Duration::from_secs(10),
            custom_url: None,
            connect_timeout: Duration::from_secs(15),
            join_timeout: Duration::from_secs(10),
            websocket: WebSocketOptions::default(),
        }
    }
}

impl RealtimeConfig {
    /// Build the websocket URL, honoring `custom_url` when set. The API key
    /// is percent-encoded; `custom_url` is used as given.
    pub fn realtime_url(&self) -> String {
        if let Some(url) = &self.custom_url {
            return url.clone();
        }
        let scheme = if self.secure { "wss" } else { "ws" };
        format!(
            "{scheme}://{}/realtime/v1/websocket?apikey={}",
            self.host,
            urlencoding::encode(&self.api_key)
        )
    }
}

/// Drop the query string so keys never reach the logs.
pub(crate) fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
