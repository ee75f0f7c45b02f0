//! Failures that are recovered from internally but must stay observable.

use tokio::sync::broadcast;

use crate::error::RealtimeError;

/// A recovered failure, published alongside the matching log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An inbound frame was dropped; the receive loop kept running.
    MalformedMessage { error: RealtimeError },
    /// A heartbeat went unanswered; a reconnect was scheduled.
    HeartbeatTimeout { error: RealtimeError },
    /// The automatic reconnect after a heartbeat timeout failed.
    ReconnectFailed { error: RealtimeError },
    /// A channel joined before a heartbeat timeout could not be rejoined.
    ChannelRejoinFailed { topic: String, error: RealtimeError },
    /// A rotated access token could not be delivered to a channel.
    TokenRefreshFailed { topic: String, error: RealtimeError },
}

pub(crate) struct DiagnosticBus {
    sender: broadcast::Sender<Diagnostic>,
}

impl DiagnosticBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<Diagnostic> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, diagnostic: Diagnostic) -> usize {
        self.sender.send(diagnostic).unwrap_or(0)
    }
}
