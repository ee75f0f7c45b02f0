//! Builder that configures a channel before it is registered.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::{ChannelConfig, ChannelListener, RealtimeChannel};
use crate::client::ClientInner;
use crate::error::Result;

/// Configures a channel; [`build`](Self::build) registers it with the client
/// without joining, [`build_and_join`](Self::build_and_join) also joins.
pub struct RealtimeChannelBuilder {
    client: Arc<ClientInner>,
    topic: String,
    config: ChannelConfig,
    listeners: HashMap<String, Vec<ChannelListener>>,
    broadcast_listeners: HashMap<String, Vec<ChannelListener>>,
}

impl RealtimeChannelBuilder {
    pub(crate) fn new(client: Arc<ClientInner>, topic: String) -> Self {
        Self {
            client,
            topic,
            config: ChannelConfig::default(),
            listeners: HashMap::new(),
            broadcast_listeners: HashMap::new(),
        }
    }

    pub fn config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn broadcast(mut self, self_send: bool, ack: bool) -> Self {
        self.config.broadcast.self_send = self_send;
        self.config.broadcast.ack = ack;
        self
    }

    pub fn presence_key(mut self, key: impl Into<String>) -> Self {
        self.config.presence.key = key.into();
        self
    }

    pub fn on<F>(mut self, event: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event.into())
            .or_default()
            .push(Arc::new(callback));
        self
    }

    pub fn on_broadcast<F>(mut self, event: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.broadcast_listeners
            .entry(event.into())
            .or_default()
            .push(Arc::new(callback));
        self
    }

    /// Create the channel and register it under its topic, NOT_JOINED.
    pub fn build(self) -> RealtimeChannel {
        let channel = RealtimeChannel::new(
            self.topic,
            self.config,
            Arc::downgrade(&self.client),
            self.listeners,
            self.broadcast_listeners,
        );
        self.client.registry.add(channel.clone());
        channel
    }

    /// Build, register, and join in one step.
    pub async fn build_and_join(self) -> Result<RealtimeChannel> {
        let channel = self.build();
        channel.join().await?;
        Ok(channel)
    }
}
