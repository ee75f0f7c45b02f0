//! Ref allocation and heartbeat bookkeeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::client::ClientInner;

/// Per-connection, monotonically increasing message ref.
#[derive(Debug, Default)]
pub(crate) struct RefCounter(AtomicU64);

impl RefCounter {
    pub(crate) fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one heartbeat tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeartbeatTick {
    /// Send a heartbeat carrying this ref.
    Send(u64),
    /// The previous heartbeat was never answered.
    TimedOut { heartbeat_ref: u64 },
}

/// Tracks the single outstanding heartbeat (0 = none).
#[derive(Debug, Default)]
pub(crate) struct HeartbeatMonitor {
    outstanding: AtomicU64,
}

impl HeartbeatMonitor {
    /// Advance one interval. A heartbeat still outstanding is a timeout;
    /// both the outstanding ref and the ref counter are cleared.
    pub(crate) fn tick(&self, refs: &RefCounter) -> HeartbeatTick {
        let pending = self.outstanding.swap(0, Ordering::SeqCst);
        if pending != 0 {
            refs.reset();
            return HeartbeatTick::TimedOut {
                heartbeat_ref: pending,
            };
        }
        let heartbeat_ref = refs.next();
        self.outstanding.store(heartbeat_ref, Ordering::SeqCst);
        HeartbeatTick::Send(heartbeat_ref)
    }

    /// Consume the outstanding heartbeat if `msg_ref` answers it.
    pub(crate) fn acknowledge(&self, msg_ref: Option<&str>) -> bool {
        let Some(parsed) = msg_ref.and_then(|r| r.parse::<u64>().ok()) else {
            return false;
        };
        parsed != 0
            && self
                .outstanding
                .compare_exchange(parsed, 0, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn outstanding(&self) -> Option<u64> {
        match self.outstanding.load(Ordering::SeqCst) {
            0 => None,
            r => Some(r),
        }
    }

    pub(crate) fn clear(&self) {
        self.outstanding.store(0, Ordering::SeqCst);
    }
}

/// Tick every heartbeat interval until a step asks to stop. The first
/// heartbeat goes out one full interval after connecting.
pub(crate) async fn heartbeat_loop(inner: Arc<ClientInner>) {
    let period = inner.config.heartbeat_interval;
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if !inner.heartbeat_step().await {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refs_start_at_one_and_reset() {
        let refs = RefCounter::default();
        assert_eq!(refs.next(), 1);
        assert_eq!(refs.next(), 2);
        refs.reset();
        assert_eq!(refs.current(), 0);
        assert_eq!(refs.next(), 1);
    }

    #[test]
    fn first_tick_sends_and_records_ref() {
        let refs = RefCounter::default();
        let monitor = HeartbeatMonitor::default();
        assert_eq!(monitor.tick(&refs), HeartbeatTick::Send(1));
        assert_eq!(monitor.outstanding(), Some(1));
    }

    #[test]
    fn acknowledged_heartbeat_allows_next_send() {
        let refs = RefCounter::default();
        let monitor = HeartbeatMonitor::default();
        monitor.tick(&refs);
        assert!(monitor.acknowledge(Some("1")));
        assert_eq!(monitor.outstanding(), None);
        assert_eq!(monitor.tick(&refs), HeartbeatTick::Send(2));
    }

    #[test]
    fn second_tick_without_reply_times_out_and_resets_refs() {
        let refs = RefCounter::default();
        let monitor = HeartbeatMonitor::default();
        refs.next();
        refs.next();
        assert_eq!(monitor.tick(&refs), HeartbeatTick::Send(3));
        assert_eq!(
            monitor.tick(&refs),
            HeartbeatTick::TimedOut { heartbeat_ref: 3 }
        );
        assert_eq!(refs.current(), 0);
        assert_eq!(monitor.outstanding(), None);
    }

    #[test]
    fn acknowledge_ignores_other_refs() {
        let refs = RefCounter::default();
        let monitor = HeartbeatMonitor::default();
        monitor.tick(&refs);
        assert!(!monitor.acknowledge(Some("2")));
        assert!(!monitor.acknowledge(Some("not-a-number")));
        assert!(!monitor.acknowledge(None));
        assert_eq!(monitor.outstanding(), Some(1));
    }

    #[test]
    fn acknowledge_without_outstanding_heartbeat_is_false() {
        let monitor = HeartbeatMonitor::default();
        assert!(!monitor.acknowledge(Some("0")));
        assert!(!monitor.acknowledge(Some("1")));
    }
}
