//! In-memory connection factory for driving the client from tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};

use crate::client::RealtimeClient;
use crate::codec::{events, MessageCodec, RealtimeMessage};
use crate::config::{RealtimeConfig, WebSocketOptions};
use crate::error::{RealtimeError, Result};
use crate::session::StaticSessionProvider;
use crate::status::ConnectionStatus;
use crate::transport::{CloseReason, Connection, ConnectionFactory, FrameSink};

/// What the client wrote to the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outbound {
    Frame(String),
    Close(CloseReason),
}

/// Connection factory that hands the test a [`MockServer`] per open.
pub(crate) struct MockConnector {
    urls: Mutex<Vec<String>>,
    refuse: AtomicBool,
    servers: mpsc::UnboundedSender<MockServer>,
}

impl MockConnector {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<MockServer>) {
        let (servers, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            urls: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
            servers,
        });
        (connector, rx)
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }

    /// Make every following open fail.
    pub(crate) fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectionFactory for MockConnector {
    async fn open(&self, url: &str, _options: &WebSocketOptions) -> Result<Connection> {
        self.urls.lock().push(url.to_string());
        if self.refuse.load(Ordering::SeqCst) {
            return Err(RealtimeError::Transport("connection refused".into()));
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Result<String>>();
        let frames = stream::unfold(in_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed();

        let _ = self.servers.send(MockServer {
            outbound: out_rx,
            inbound: Some(in_tx),
        });
        Ok(Connection {
            sink: Box::new(MockSink { outbound: out_tx }),
            stream: frames,
        })
    }
}

struct MockSink {
    outbound: mpsc::UnboundedSender<Outbound>,
}

#[async_trait]
impl FrameSink for MockSink {
    async fn send(&mut self, text: String) -> Result<()> {
        self.outbound
            .send(Outbound::Frame(text))
            .map_err(|_| RealtimeError::Transport("server gone".into()))
    }

    async fn close(&mut self, reason: CloseReason) -> Result<()> {
        self.outbound
            .send(Outbound::Close(reason))
            .map_err(|_| RealtimeError::Transport("server gone".into()))
    }
}

/// Server side of one mock connection.
pub(crate) struct MockServer {
    outbound: mpsc::UnboundedReceiver<Outbound>,
    inbound: Option<mpsc::UnboundedSender<Result<String>>>,
}

impl MockServer {
    pub(crate) async fn next_outbound(&mut self) -> Outbound {
        tokio::time::timeout(Duration::from_secs(30), self.outbound.recv())
            .await
            .expect("timed out waiting for client output")
            .expect("client dropped the connection")
    }

    /// Next decoded message; panics if the client closed instead.
    pub(crate) async fn next_message(&mut self) -> RealtimeMessage {
        match self.next_outbound().await {
            Outbound::Frame(text) => MessageCodec::new().decode(&text).expect("client sent bad JSON"),
            Outbound::Close(reason) => panic!("expected a frame, got close {reason:?}"),
        }
    }

    /// Output already written by the client, without waiting.
    pub(crate) fn try_outbound(&mut self) -> Option<Outbound> {
        self.outbound.try_recv().ok()
    }

    pub(crate) fn send_raw(&self, text: &str) {
        if let Some(inbound) = &self.inbound {
            let _ = inbound.send(Ok(text.to_string()));
        }
    }

    pub(crate) fn send(&self, message: &RealtimeMessage) {
        self.send_raw(&MessageCodec::new().encode(message));
    }

    pub(crate) fn send_event(&self, topic: &str, event: &str, payload: Value) {
        self.send(&RealtimeMessage::new(topic, event, payload, None));
    }

    /// Answer `request` with a `phx_reply` of the given status.
    pub(crate) fn reply(&self, request: &RealtimeMessage, status: &str, response: Value) {
        self.send(&RealtimeMessage::new(
            request.topic.clone(),
            events::REPLY,
            json!({ "status": status, "response": response }),
            request.msg_ref.clone(),
        ));
    }

    pub(crate) fn reply_ok(&self, request: &RealtimeMessage) {
        self.reply(request, "ok", json!({}));
    }

    /// Terminal socket error.
    pub(crate) fn fail(&self, error: &str) {
        if let Some(inbound) = &self.inbound {
            let _ = inbound.send(Err(RealtimeError::Transport(error.to_string())));
        }
    }

    /// Peer closes the socket: the client's frame stream ends.
    pub(crate) fn close(&mut self) {
        self.inbound = None;
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub(crate) fn test_config() -> RealtimeConfig {
    RealtimeConfig {
        host: "project.supabase.co".into(),
        api_key: "anon-key".into(),
        ..RealtimeConfig::default()
    }
}

/// A client wired to a [`MockConnector`] and a [`StaticSessionProvider`].
pub(crate) struct Harness {
    pub(crate) client: RealtimeClient,
    pub(crate) connector: Arc<MockConnector>,
    pub(crate) session: Arc<StaticSessionProvider>,
    pub(crate) servers: mpsc::UnboundedReceiver<MockServer>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_config(test_config())
    }

    pub(crate) fn with_config(config: RealtimeConfig) -> Self {
        let (connector, servers) = MockConnector::new();
        let session = Arc::new(StaticSessionProvider::with_token("user-jwt"));
        let client = RealtimeClient::new(config, connector.clone(), session.clone());
        Self {
            client,
            connector,
            session,
            servers,
        }
    }

    /// Connect and return the server side of the new socket.
    pub(crate) async fn connect(&mut self) -> MockServer {
        self.client.connect().await.expect("connect failed");
        self.next_server().await
    }

    pub(crate) async fn next_server(&mut self) -> MockServer {
        tokio::time::timeout(Duration::from_secs(30), self.servers.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("connector dropped")
    }

    /// Every status the client moves through, in order.
    pub(crate) fn record_statuses(&self) -> Arc<Mutex<Vec<ConnectionStatus>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        self.client.on_status_change(move |status| sink.lock().push(status));
        seen
    }
}

/// Read from `rx` until `want` arrives.
pub(crate) async fn wait_for_status(
    rx: &mut broadcast::Receiver<ConnectionStatus>,
    want: ConnectionStatus,
) {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match rx.recv().await {
                Ok(status) if status == want => return,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("status stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for status");
}
