//! Realtime transport for Supabase-style Phoenix Channels.
//!
//! One persistent websocket multiplexes many channel subscriptions. The
//! [`RealtimeClient`] owns the socket, a heartbeat that detects dead
//! connections, and a registry routing inbound messages to
//! [`RealtimeChannel`]s by topic.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use supa_realtime::{RealtimeClient, RealtimeConfig, StaticSessionProvider};
//!
//! # async fn run() -> Result<(), supa_realtime::RealtimeError> {
//! let config = RealtimeConfig {
//!     host: "abcdefgh.supabase.co".into(),
//!     api_key: "anon-key".into(),
//!     ..Default::default()
//! };
//! let client = RealtimeClient::with_tungstenite(config, Arc::new(StaticSessionProvider::anonymous()));
//! client.connect().await?;
//!
//! let room = client
//!     .channel("realtime:room:1")
//!     .on("new_message", |payload| println!("{payload}"))
//!     .build_and_join()
//!     .await?;
//! room.broadcast("typing", serde_json::json!({ "user": "alice" })).await?;
//! # Ok(())
//! # }
//! ```

mod channel;
mod client;
mod codec;
mod config;
mod diagnostics;
mod error;
mod heartbeat;
mod registry;
mod session;
mod status;
mod transport;

#[cfg(test)]
mod testing;

pub use channel::{
    BroadcastConfig, ChannelConfig, ChannelListener, ChannelState, PresenceConfig,
    RealtimeChannel, RealtimeChannelBuilder,
};
pub use client::RealtimeClient;
pub use codec::{events, MessageCodec, RealtimeMessage, PHOENIX_TOPIC};
pub use config::{RealtimeConfig, WebSocketOptions};
pub use diagnostics::Diagnostic;
pub use error::{RealtimeError, Result};
pub use registry::ChannelRegistry;
pub use session::{Session, SessionProvider, StaticSessionProvider};
pub use status::{ConnectionStatus, StatusListener};
pub use transport::{
    CloseReason, Connection, ConnectionFactory, FrameSink, FrameStream, TungsteniteConnector,
};
