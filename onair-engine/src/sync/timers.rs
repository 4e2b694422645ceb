//! Cancellable timer pool
//!
//! The settle window and the countdown ticks are both "wait N, unless
//! cancelled" patterns; this is the single primitive behind both. Each
//! pending timer is a spawned task that sleeps and then sends a command
//! into the engine queue; cancelling aborts the task before it fires.

use onair_common::FieldName;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Settle window for one field's in-flight write
    Settle(FieldName),
    /// Next countdown tick of the airing session
    Countdown,
}

/// Arena of pending timers keyed by what they are waiting for
///
/// Scheduling a key that is already pending replaces the old timer.
pub struct TimerPool<M: Send + 'static> {
    tx: mpsc::Sender<M>,
    pending: HashMap<TimerKey, JoinHandle<()>>,
}

impl<M: Send + 'static> TimerPool<M> {
    pub fn new(tx: mpsc::Sender<M>) -> Self {
        Self {
            tx,
            pending: HashMap::new(),
        }
    }

    /// Deliver `message` to the engine queue after `delay`, unless cancelled
    pub fn schedule(&mut self, key: TimerKey, delay: Duration, message: M) {
        self.cancel(key);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(message).await;
        });
        self.pending.insert(key, handle);
    }

    /// Abort a pending timer; a no-op when none is pending
    pub fn cancel(&mut self, key: TimerKey) {
        if let Some(handle) = self.pending.remove(&key) {
            handle.abort();
        }
    }

    /// Number of timers that have not fired or been cancelled yet
    pub fn pending_count(&mut self) -> usize {
        self.pending.retain(|_, handle| !handle.is_finished());
        self.pending.len()
    }
}
