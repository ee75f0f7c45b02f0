//! One logical subscription multiplexed over the shared socket.
//!
//! A channel owns its join/leave state machine and the listeners that
//! inbound events for its topic are dispatched to. Replies to its own
//! requests are matched by ref before any listener sees them.

mod builder;
mod config;


pub use builder::RealtimeChannelBuilder;
pub use config::{BroadcastConfig, ChannelConfig, PresenceConfig};

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::client::ClientInner;
use crate::codec::{events, RealtimeMessage};
use crate::error::{RealtimeError, Result};

/// Join state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    NotJoined,
    Joining,
    Joined,
    Leaving,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotJoined => "NOT_JOINED",
            Self::Joining => "JOINING",
            Self::Joined => "JOINED",
            Self::Leaving => "LEAVING",
        };
        f.write_str(name)
    }
}

/// Callback invoked with the payload of a matching inbound event.
pub type ChannelListener = Arc<dyn Fn(&Value) + Send + Sync>;

type ListenerMap = HashMap<String, Vec<ChannelListener>>;

/// Handle to a channel. Clones share the same state.
#[derive(Clone)]
pub struct RealtimeChannel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    topic: String,
    config: ChannelConfig,
    client: Weak<ClientInner>,
    state: Mutex<ChannelState>,
    listeners: RwLock<ListenerMap>,
    broadcast_listeners: RwLock<ListenerMap>,
    pending_replies: Mutex<HashMap<String, oneshot::Sender<RealtimeMessage>>>,
}

impl std::fmt::Debug for RealtimeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeChannel")
            .field("topic", &self.inner.topic)
            .field("state", &self.state())
            .finish()
    }
}

impl RealtimeChannel {
    pub(crate) fn new(
        topic: String,
        config: ChannelConfig,
        client: Weak<ClientInner>,
        listeners: ListenerMap,
        broadcast_listeners: ListenerMap,
    ) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                topic,
                config,
                client,
                state: Mutex::new(ChannelState::NotJoined),
                listeners: RwLock::new(listeners),
                broadcast_listeners: RwLock::new(broadcast_listeners),
                pending_replies: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// A channel bound to no client.
    #[cfg(test)]
    pub(crate) fn detached(topic: impl Into<String>) -> Self {
        Self::new(
            topic.into(),
            ChannelConfig::default(),
            Weak::new(),
            HashMap::new(),
            HashMap::new(),
        )
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ChannelState {
        *self.inner.state.lock()
    }

    /// Whether two handles refer to the same channel.
    pub fn ptr_eq(&self, other: &RealtimeChannel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register `callback` for inbound messages whose event is `event`.
    /// Callbacks for one event run in registration order.
    pub fn on<F>(&self, event: impl Into<String>, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner
            .listeners
            .write()
            .entry(event.into())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Register `callback` for inbound broadcasts whose inner event is
    /// `event`. The callback receives the inner payload.
    pub fn on_broadcast<F>(&self, event: impl Into<String>, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner
            .broadcast_listeners
            .write()
            .entry(event.into())
            .or_default()
            .push(Arc::new(callback));
    }

    // -----------------------------------------------------------------------
    // Join / leave
    // -----------------------------------------------------------------------

    /// Join the topic. The channel is JOINING as soon as this is called and
    /// JOINED once the server confirms; a rejection or timeout leaves it
    /// NOT_JOINED and returns [`RealtimeError::ChannelJoin`].
    pub async fn join(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            match *state {
                ChannelState::Joined => return Ok(()),
                ChannelState::Joining | ChannelState::Leaving => {
                    return Err(self.join_error(format!("channel is {}", *state)));
                }
                ChannelState::NotJoined => *state = ChannelState::Joining,
            }
        }

        let client = match self.inner.client.upgrade() {
            Some(client) => client,
            None => {
                self.set_state(ChannelState::NotJoined);
                return Err(self.join_error(RealtimeError::NotConnected.to_string()));
            }
        };

        // A channel left earlier, or dropped on disconnect, registers again.
        if !client
            .registry
            .get(self.topic())
            .is_some_and(|current| current.ptr_eq(self))
        {
            client.registry.add(self.clone());
        }

        let payload = self
            .inner
            .config
            .to_join_payload(client.access_token().as_deref());
        let reply = self.request(&client, events::JOIN, payload).await;

        match reply {
            Ok(reply) if reply.reply_status() == Some("ok") => {
                let joined = self.transition(ChannelState::Joining, ChannelState::Joined);
                if !joined {
                    return Err(self.join_error("channel was reset while joining".into()));
                }
                info!(topic = %self.topic(), "Joined channel");
                Ok(())
            }
            Ok(reply) => {
                self.set_state(ChannelState::NotJoined);
                let reason = reply.reply_reason();
                warn!(topic = %self.topic(), reason = %reason, "Channel join rejected");
                Err(self.join_error(reason))
            }
            Err(e) => {
                self.set_state(ChannelState::NotJoined);
                warn!(topic = %self.topic(), error = %e, "Channel join failed");
                Err(match e {
                    RealtimeError::ChannelJoin { .. } => e,
                    other => self.join_error(other.to_string()),
                })
            }
        }
    }

    /// Leave the topic. Waits for the server's confirmation (or the join
    /// timeout), then removes the channel from the registry and settles to
    /// NOT_JOINED.
    pub async fn leave(&self) {
        let previous = std::mem::replace(&mut *self.inner.state.lock(), ChannelState::Leaving);
        let Some(client) = self.inner.client.upgrade() else {
            self.set_state(ChannelState::NotJoined);
            return;
        };

        if previous != ChannelState::NotJoined {
            if let Err(e) = self.request(&client, events::LEAVE, json!({})).await {
                debug!(topic = %self.topic(), error = %e, "Leave not acknowledged");
            }
        }

        client.registry.remove_channel(self);
        self.reset();
        info!(topic = %self.topic(), "Left channel");
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Send a broadcast event to every subscriber of the topic.
    pub async fn broadcast(&self, event: &str, payload: Value) -> Result<()> {
        self.push(
            events::BROADCAST,
            json!({
                "type": "broadcast",
                "event": event,
                "payload": payload
            }),
        )
        .await
    }

    /// Track this client's presence on the topic.
    pub async fn track(&self, payload: Value) -> Result<()> {
        self.push(
            events::PRESENCE,
            json!({
                "type": "presence",
                "event": "track",
                "payload": payload
            }),
        )
        .await
    }

    /// Stop tracking presence on the topic.
    pub async fn untrack(&self) -> Result<()> {
        self.push(
            events::PRESENCE,
            json!({
                "type": "presence",
                "event": "untrack"
            }),
        )
        .await
    }

    /// Send a message on this topic without waiting for a reply.
    pub async fn push(&self, event: &str, payload: Value) -> Result<()> {
        let client = self.client()?;
        let message = RealtimeMessage::new(self.topic(), event, payload, Some(client.next_ref()));
        client.push(&message).await
    }

    /// Hand a rotated access token to the server for this topic.
    pub(crate) async fn send_access_token(&self, client: &ClientInner, token: &str) -> Result<()> {
        let message = RealtimeMessage::new(
            self.topic(),
            events::ACCESS_TOKEN,
            json!({ "access_token": token }),
            Some(client.next_ref()),
        );
        client.push(&message).await
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Route one inbound message for this topic.
    pub(crate) fn dispatch(&self, message: &RealtimeMessage) {
        if message.event == events::REPLY {
            let waiter = message
                .msg_ref
                .as_ref()
                .and_then(|r| self.inner.pending_replies.lock().remove(r));
            if let Some(waiter) = waiter {
                let _ = waiter.send(message.clone());
                return;
            }
        }

        match message.event.as_str() {
            events::CLOSE => {
                info!(topic = %self.topic(), "Channel closed by server");
                self.set_state(ChannelState::NotJoined);
            }
            events::ERROR => {
                warn!(topic = %self.topic(), "Channel error");
                self.set_state(ChannelState::NotJoined);
            }
            events::BROADCAST => self.dispatch_broadcast(&message.payload),
            _ => {}
        }

        Self::emit(&self.inner.listeners, &message.event, &message.payload);
    }

    fn dispatch_broadcast(&self, payload: &Value) {
        let Some(inner_event) = payload.get("event").and_then(|e| e.as_str()) else {
            return;
        };
        let inner_payload = payload.get("payload").cloned().unwrap_or(Value::Null);
        debug!(topic = %self.topic(), event = %inner_event, "Broadcast received");
        Self::emit(&self.inner.broadcast_listeners, inner_event, &inner_payload);
    }

    fn emit(listeners: &RwLock<ListenerMap>, event: &str, payload: &Value) {
        let callbacks = listeners.read().get(event).cloned();
        for callback in callbacks.iter().flatten() {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                warn!(event, "Channel listener panicked");
            }
        }
    }

    /// Drop back to NOT_JOINED after the connection went away. Outstanding
    /// requests fail immediately.
    pub(crate) fn reset(&self) {
        self.set_state(ChannelState::NotJoined);
        self.inner.pending_replies.lock().clear();
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn client(&self) -> Result<Arc<ClientInner>> {
        self.inner.client.upgrade().ok_or(RealtimeError::NotConnected)
    }

    /// Push `event` and wait for the `phx_reply` carrying the same ref.
    async fn request(
        &self,
        client: &ClientInner,
        event: &str,
        payload: Value,
    ) -> Result<RealtimeMessage> {
        let msg_ref = client.next_ref();
        let (tx, rx) = oneshot::channel();
        self.inner
            .pending_replies
            .lock()
            .insert(msg_ref.clone(), tx);

        let message = RealtimeMessage::new(self.topic(), event, payload, Some(msg_ref.clone()));
        if let Err(e) = client.push(&message).await {
            self.inner.pending_replies.lock().remove(&msg_ref);
            return Err(e);
        }

        let timeout = client.config.join_timeout;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            // Sender dropped: the connection was torn down.
            Ok(Err(_)) => Err(RealtimeError::NotConnected),
            Err(_) => {
                self.inner.pending_replies.lock().remove(&msg_ref);
                Err(self.join_error(format!("no reply to {event} within {timeout:?}")))
            }
        }
    }

    fn join_error(&self, reason: String) -> RealtimeError {
        RealtimeError::ChannelJoin {
            topic: self.topic().to_string(),
            reason,
        }
    }

    fn set_state(&self, next: ChannelState) {
        *self.inner.state.lock() = next;
    }

    /// Compare-and-set on the join state.
    fn transition(&self, from: ChannelState, to: ChannelState) -> bool {
        let mut state = self.inner.state.lock();
        if *state != from {
            return false;
        }
        *state = to;
        true
    }
}
