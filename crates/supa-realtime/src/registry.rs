//! Topic → channel routing table shared by the public API and the receive loop.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::channel::RealtimeChannel;

/// Thread-safe map from topic to channel.
///
/// Every access takes the lock for the duration of one map operation only;
/// [`snapshot`](Self::snapshot) hands out a copy so callers can iterate or
/// dispatch without holding it.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, RealtimeChannel>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel under its topic, returning the one it replaced.
    pub fn add(&self, channel: RealtimeChannel) -> Option<RealtimeChannel> {
        self.channels
            .write()
            .insert(channel.topic().to_string(), channel)
    }

    pub fn remove(&self, topic: &str) -> Option<RealtimeChannel> {
        self.channels.write().remove(topic)
    }

    /// Remove `channel` only if it is still the one registered for its topic.
    pub(crate) fn remove_channel(&self, channel: &RealtimeChannel) -> bool {
        let mut map = self.channels.write();
        match map.get(channel.topic()) {
            Some(current) if current.ptr_eq(channel) => {
                map.remove(channel.topic());
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, topic: &str) -> Option<RealtimeChannel> {
        self.channels.read().get(topic).cloned()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.channels.read().contains_key(topic)
    }

    /// Immutable copy of the current mapping.
    pub fn snapshot(&self) -> HashMap<String, RealtimeChannel> {
        self.channels.read().clone()
    }

    /// Remove and return every channel.
    pub(crate) fn drain(&self) -> Vec<RealtimeChannel> {
        self.channels.write().drain().map(|(_, ch)| ch).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }
}
