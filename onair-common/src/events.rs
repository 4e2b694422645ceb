//! Event types for the on-air event system
//!
//! Provides shared event definitions and the EventBus used to fan state
//! changes out to SSE clients and other observers. Events are broadcast
//! lossily: a slow subscriber drops old events rather than back-pressuring
//! the sync engine.

use crate::fields::{FieldContent, FieldName};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why a countdown ended without going live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The operator aborted the countdown
    Operator,
    /// Another operator activated the field first
    Preempted,
}

/// On-air event types
///
/// Events are broadcast via [`EventBus`] and serialized for SSE
/// transmission. All variants carry a UTC timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OnAirEvent {
    /// A field's visibility changed through a local toggle
    FieldVisibilityChanged {
        field: FieldName,
        visible: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A remote change was adopted as local truth
    FieldAdopted {
        field: FieldName,
        visible: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An invalid remote state was corrected (forced back off)
    RemoteCorrected {
        field: FieldName,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Countdown to air started
    CountdownStarted {
        field: FieldName,
        remaining_ticks: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Countdown decremented by one second
    CountdownTick {
        field: FieldName,
        remaining_ticks: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Countdown ended without airing
    CountdownCancelled {
        field: FieldName,
        reason: CancelReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The combined go-live write was dispatched and acknowledged
    WentLive {
        field: FieldName,
        content: FieldContent,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A remote write failed; local state was reverted
    WriteFailed {
        field: FieldName,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Broadcast bus for [`OnAirEvent`]
///
/// Thin wrapper over `tokio::sync::broadcast` so emit semantics live in
/// one place. Emission never blocks and never fails: with no subscribers
/// the event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OnAirEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<OnAirEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the no-subscribers case
    pub fn emit_lossy(&self, event: OnAirEvent) {
        let _ = self.tx.send(event);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
