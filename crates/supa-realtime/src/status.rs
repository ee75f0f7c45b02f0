//! Connection status and the single primitive that publishes its transitions.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::warn;

/// Public status of the realtime connection.
///
/// There is no reconnecting state: an automatic reconnect passes back
/// through [`ConnectionStatus::Connecting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
        };
        f.write_str(name)
    }
}

/// Callback invoked synchronously on every status transition.
pub type StatusListener = Arc<dyn Fn(ConnectionStatus) + Send + Sync>;

struct StatusState {
    current: ConnectionStatus,
    listeners: Vec<StatusListener>,
    /// Transitions not yet delivered, oldest first.
    pending: VecDeque<ConnectionStatus>,
    /// Set while some caller is delivering `pending`.
    delivering: bool,
}

/// Current status plus its subscribers, updated in one place so the
/// queryable value and what listeners observed can never disagree.
///
/// No lock is held while listeners run. A transition made from inside a
/// listener, or from another thread mid-delivery, is queued and delivered
/// by the caller already delivering, after the current status reached
/// every listener.
pub(crate) struct StatusBroadcast {
    state: Mutex<StatusState>,
    sender: broadcast::Sender<ConnectionStatus>,
}

impl StatusBroadcast {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            state: Mutex::new(StatusState {
                current: ConnectionStatus::Disconnected,
                listeners: Vec::new(),
                pending: VecDeque::new(),
                delivering: false,
            }),
            sender,
        }
    }

    pub(crate) fn current(&self) -> ConnectionStatus {
        self.state.lock().current
    }

    pub(crate) fn add_listener(&self, listener: StatusListener) {
        self.state.lock().listeners.push(listener);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ConnectionStatus> {
        self.sender.subscribe()
    }

    /// Move to `next` and notify listeners in registration order, then
    /// async subscribers. Returns `false` if the status was already `next`.
    pub(crate) fn transition(&self, next: ConnectionStatus) -> bool {
        {
            let mut state = self.state.lock();
            if state.current == next {
                return false;
            }
            state.current = next;
            state.pending.push_back(next);
            if state.delivering {
                return true;
            }
            state.delivering = true;
        }

        loop {
            let (status, listeners) = {
                let mut state = self.state.lock();
                match state.pending.pop_front() {
                    Some(status) => (status, state.listeners.clone()),
                    None => {
                        state.delivering = false;
                        return true;
                    }
                }
            };
            for listener in &listeners {
                if panic::catch_unwind(AssertUnwindSafe(|| listener(status))).is_err() {
                    warn!(%status, "Status listener panicked");
                }
            }
            let _ = self.sender.send(status);
        }
    }
}
