//! Socket lifecycle: connect, teardown, and the tasks that run while connected.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::{FutureExt, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ClientInner;
use crate::channel::{ChannelState, RealtimeChannel};
use crate::codec::RealtimeMessage;
use crate::config::strip_query;
use crate::diagnostics::Diagnostic;
use crate::error::{RealtimeError, Result};
use crate::heartbeat::{heartbeat_loop, HeartbeatTick};
use crate::session::Session;
use crate::status::ConnectionStatus;
use crate::transport::{CloseReason, Connection, FrameStream};

const CLOSE_REASON: &str = "Connection closed by library";

/// Background tasks belonging to one open socket.
pub(crate) struct ConnectionTasks {
    epoch: u64,
    receive: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
    session: JoinHandle<()>,
}

impl ConnectionTasks {
    fn abort(&self) {
        self.receive.abort();
        self.heartbeat.abort();
        self.session.abort();
    }
}

impl ClientInner {
    pub(crate) async fn connect(self: &Arc<Self>) -> Result<()> {
        if self.status.current() == ConnectionStatus::Connected {
            return Err(RealtimeError::AlreadyConnected);
        }
        self.status.transition(ConnectionStatus::Connecting);

        let url = self.config.realtime_url();
        info!(url = %strip_query(&url), "Connecting to realtime");

        let opened = tokio::time::timeout(
            self.config.connect_timeout,
            self.connector.open(&url, &self.config.websocket),
        )
        .await
        .unwrap_or(Err(RealtimeError::ConnectTimeout(self.config.connect_timeout)));

        let Connection { sink, stream } = match opened {
            Ok(connection) => connection,
            Err(e) => {
                warn!(error = %e, "Realtime connect failed");
                self.status.transition(ConnectionStatus::Disconnected);
                return Err(e);
            }
        };

        self.refs.reset();
        self.heartbeat.clear();
        *self.access_token.write() = self.session.current_access_token();
        *self.socket.lock().await = Some(sink);

        self.status.transition(ConnectionStatus::Connected);
        info!("Realtime connected");

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let changes = self.session.session_changes();
        {
            // Spawned under the lock so a receive loop that ends at once
            // finds its own tasks registered.
            let mut tasks = self.tasks.lock();
            if let Some(stale) = tasks.take() {
                stale.abort();
            }
            *tasks = Some(ConnectionTasks {
                epoch,
                receive: tokio::spawn(receive_loop(Arc::clone(self), stream, epoch)),
                heartbeat: tokio::spawn(heartbeat_loop(Arc::clone(self))),
                session: tokio::spawn(session_watch(Arc::clone(self), changes)),
            });
        }
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let tasks = self.tasks.lock().take();
        if let Some(tasks) = tasks {
            tasks.abort();
        }

        let sink = self.socket.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close(CloseReason::normal(CLOSE_REASON)).await {
                debug!(error = %e, "Socket close failed");
            }
        }

        self.heartbeat.clear();
        self.teardown_channels();
        if self.status.transition(ConnectionStatus::Disconnected) {
            info!("Realtime disconnected");
        }
    }

    /// The receive loop for `epoch` ended on its own. Ignored if a newer
    /// connection or an explicit disconnect already took over.
    async fn connection_lost(&self, epoch: u64) {
        let tasks = {
            let mut tasks = self.tasks.lock();
            match tasks.as_ref() {
                Some(current) if current.epoch == epoch => tasks.take(),
                _ => None,
            }
        };
        let Some(tasks) = tasks else {
            return;
        };
        tasks.heartbeat.abort();
        tasks.session.abort();

        self.socket.lock().await.take();
        self.heartbeat.clear();
        self.teardown_channels();
        if self.status.transition(ConnectionStatus::Disconnected) {
            info!("Realtime connection closed");
        }
    }

    /// Empty the registry and settle every channel to NOT_JOINED.
    fn teardown_channels(&self) {
        for channel in self.registry.drain() {
            channel.reset();
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    fn handle_frame(&self, text: &str) {
        let message = match self.codec.decode(text) {
            Ok(message) => message,
            Err(error) => {
                warn!(error = %error, "Dropping malformed realtime frame");
                self.diagnostics
                    .publish(Diagnostic::MalformedMessage { error });
                return;
            }
        };

        if self.heartbeat.acknowledge(message.msg_ref.as_deref()) {
            debug!(heartbeat_ref = ?message.msg_ref, "Heartbeat acknowledged");
            return;
        }

        match self.registry.get(&message.topic) {
            Some(channel) => {
                debug!(topic = %message.topic, event = %message.event, "Routing message");
                channel.dispatch(&message);
            }
            None => {
                debug!(topic = %message.topic, event = %message.event, "No channel for topic");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Heartbeat
    // -----------------------------------------------------------------------

    /// One heartbeat tick. Returns `false` once the loop should stop.
    pub(crate) async fn heartbeat_step(self: &Arc<Self>) -> bool {
        match self.heartbeat.tick(&self.refs) {
            HeartbeatTick::Send(heartbeat_ref) => {
                debug!(heartbeat_ref, "Sending heartbeat");
                if let Err(e) = self.push(&RealtimeMessage::heartbeat(heartbeat_ref)).await {
                    warn!(heartbeat_ref, error = %e, "Heartbeat send failed");
                }
                true
            }
            HeartbeatTick::TimedOut { heartbeat_ref } => {
                let error = RealtimeError::HeartbeatTimeout { heartbeat_ref };
                warn!(heartbeat_ref, "Heartbeat timed out, reconnecting");
                self.diagnostics
                    .publish(Diagnostic::HeartbeatTimeout { error });
                tokio::spawn(Arc::clone(self).reconnect_after_timeout());
                false
            }
        }
    }

    /// Disconnect, connect again with the same configuration, and rejoin the
    /// channels that were joined. Runs detached from the heartbeat task.
    fn reconnect_after_timeout(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move {
            let rejoin: Vec<RealtimeChannel> = self
                .registry
                .snapshot()
                .into_values()
                .filter(|channel| channel.state() == ChannelState::Joined)
                .collect();

            self.disconnect().await;
            if let Err(error) = self.connect().await {
                warn!(error = %error, "Reconnect after heartbeat timeout failed");
                self.diagnostics
                    .publish(Diagnostic::ReconnectFailed { error });
                return;
            }

            for channel in rejoin {
                let inner = Arc::clone(&self);
                tokio::spawn(async move {
                    if let Err(error) = channel.join().await {
                        warn!(topic = %channel.topic(), error = %error, "Rejoin failed");
                        inner.diagnostics.publish(Diagnostic::ChannelRejoinFailed {
                            topic: channel.topic().to_string(),
                            error,
                        });
                    }
                });
            }
        }
        .boxed()
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Store `token` for future joins and hand it to every joined channel.
    pub(crate) async fn refresh_access_token(&self, token: Option<String>) {
        *self.access_token.write() = token.clone();
        let Some(token) = token else {
            return;
        };
        if self.status.current() != ConnectionStatus::Connected {
            return;
        }

        let joined: Vec<RealtimeChannel> = self
            .registry
            .snapshot()
            .into_values()
            .filter(|channel| channel.state() == ChannelState::Joined)
            .collect();
        for channel in &joined {
            if let Err(error) = channel.send_access_token(self, &token).await {
                warn!(topic = %channel.topic(), error = %error, "Token refresh failed");
                self.diagnostics.publish(Diagnostic::TokenRefreshFailed {
                    topic: channel.topic().to_string(),
                    error,
                });
            }
        }
        info!(channels = joined.len(), "Access token refreshed");
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

async fn receive_loop(inner: Arc<ClientInner>, mut stream: FrameStream, epoch: u64) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(text) => inner.handle_frame(&text),
            Err(e) => {
                warn!(error = %e, "Realtime socket error");
                break;
            }
        }
    }
    inner.connection_lost(epoch).await;
}

/// React to session changes while connected: sign-out disconnects, a new
/// token is pushed to joined channels.
async fn session_watch(inner: Arc<ClientInner>, mut changes: watch::Receiver<Option<Session>>) {
    while changes.changed().await.is_ok() {
        let session = changes.borrow_and_update().clone();
        if inner.status.current() != ConnectionStatus::Connected {
            continue;
        }
        match session {
            None => {
                info!("Session ended, disconnecting");
                *inner.access_token.write() = None;
                let inner = Arc::clone(&inner);
                tokio::spawn(async move { inner.disconnect().await });
                break;
            }
            Some(session) => {
                if inner.access_token().as_deref() != Some(session.access_token.as_str()) {
                    inner.refresh_access_token(Some(session.access_token)).await;
                }
            }
        }
    }
}
