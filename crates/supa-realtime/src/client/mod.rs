//! Public handle for the realtime connection.

mod connection;


use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use crate::channel::{RealtimeChannel, RealtimeChannelBuilder};
use crate::codec::{MessageCodec, RealtimeMessage};
use crate::config::RealtimeConfig;
use crate::diagnostics::{Diagnostic, DiagnosticBus};
use crate::error::{RealtimeError, Result};
use crate::heartbeat::{HeartbeatMonitor, RefCounter};
use crate::registry::ChannelRegistry;
use crate::session::SessionProvider;
use crate::status::{ConnectionStatus, StatusBroadcast};
use crate::transport::{ConnectionFactory, FrameSink, TungsteniteConnector};

use self::connection::ConnectionTasks;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle for the realtime connection. Clones share one socket.
///
/// `connect` and `disconnect` must not race each other on the same client;
/// callers serialize them.
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<ClientInner>,
}

impl RealtimeClient {
    pub fn new(
        config: RealtimeConfig,
        connector: Arc<dyn ConnectionFactory>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                connector,
                session,
                codec: MessageCodec::new(),
                status: StatusBroadcast::new(64),
                registry: ChannelRegistry::new(),
                socket: tokio::sync::Mutex::new(None),
                refs: RefCounter::default(),
                heartbeat: HeartbeatMonitor::default(),
                access_token: RwLock::new(None),
                tasks: Mutex::new(None),
                epoch: AtomicU64::new(0),
                diagnostics: DiagnosticBus::new(64),
            }),
        }
    }

    /// Client that opens real websockets via `tokio-tungstenite`.
    pub fn with_tungstenite(config: RealtimeConfig, session: Arc<dyn SessionProvider>) -> Self {
        Self::new(config, Arc::new(TungsteniteConnector), session)
    }

    /// Open the socket and start the receive, heartbeat, and session tasks.
    ///
    /// Fails with [`RealtimeError::AlreadyConnected`] while connected.
    pub async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    /// Stop all background tasks, close the socket, and drop every channel
    /// back to NOT_JOINED. Safe to call when already disconnected.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.current()
    }

    /// Call `callback` on every status transition, synchronously and in
    /// registration order. A transition caused from inside the callback is
    /// delivered once every listener has seen the current one.
    pub fn on_status_change<F>(&self, callback: F)
    where
        F: Fn(ConnectionStatus) + Send + Sync + 'static,
    {
        self.inner.status.add_listener(Arc::new(callback));
    }

    /// Async stream of status transitions.
    pub fn subscribe_status(&self) -> broadcast::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    /// Recovered failures: malformed frames, heartbeat timeouts, reconnect
    /// and rejoin failures, token refresh failures.
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.inner.diagnostics.subscribe()
    }

    /// Start building a channel for `topic`.
    pub fn channel(&self, topic: impl Into<String>) -> RealtimeChannelBuilder {
        RealtimeChannelBuilder::new(Arc::clone(&self.inner), topic.into())
    }

    pub fn add_channel(&self, channel: RealtimeChannel) {
        self.inner.registry.add(channel);
    }

    pub fn remove_channel(&self, topic: &str) -> Option<RealtimeChannel> {
        self.inner.registry.remove(topic)
    }

    /// Snapshot of the registered channels.
    pub fn channels(&self) -> HashMap<String, RealtimeChannel> {
        self.inner.registry.snapshot()
    }

    /// Replace the access token used for joins and push it to every joined
    /// channel.
    pub async fn set_auth(&self, access_token: Option<String>) {
        self.inner.refresh_access_token(access_token).await
    }

    pub fn access_token(&self) -> Option<String> {
        self.inner.access_token()
    }

    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// State shared by the handle, its channels, and the background tasks.
pub(crate) struct ClientInner {
    pub(crate) config: RealtimeConfig,
    connector: Arc<dyn ConnectionFactory>,
    session: Arc<dyn SessionProvider>,
    codec: MessageCodec,
    status: StatusBroadcast,
    pub(crate) registry: ChannelRegistry,
    /// Write half of the socket; the mutex serializes every send.
    socket: tokio::sync::Mutex<Option<Box<dyn FrameSink>>>,
    refs: RefCounter,
    heartbeat: HeartbeatMonitor,
    access_token: RwLock<Option<String>>,
    tasks: Mutex<Option<ConnectionTasks>>,
    /// Incremented per successful connect so stale tasks can tell they are stale.
    epoch: AtomicU64,
    diagnostics: DiagnosticBus,
}

impl ClientInner {
    pub(crate) fn next_ref(&self) -> String {
        self.refs.next().to_string()
    }

    pub(crate) fn access_token(&self) -> Option<String> {
        self.access_token.read().clone()
    }

    /// Encode and send one message.
    pub(crate) async fn push(&self, message: &RealtimeMessage) -> Result<()> {
        let text = self.codec.encode(message);
        let mut socket = self.socket.lock().await;
        let sink = socket.as_mut().ok_or(RealtimeError::NotConnected)?;
        sink.send(text).await
    }
}
