//! Shared on-air state
//!
//! Thread-safe mirror of the engine's local truth, read by HTTP handlers
//! and SSE. Only the engine actor writes here; everyone else reads.

use crate::sync::session::AiringPhase;
use onair_common::events::{EventBus, OnAirEvent};
use onair_common::{FieldContent, FieldName};
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::{broadcast, RwLock};

/// One field as the UI should currently show it
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldView {
    /// Optimistic visibility (matches the write in flight while pending)
    pub visible: bool,
    /// A write for this field is still settling
    pub pending: bool,
    /// Latest known content
    pub content: FieldContent,
}

/// Airing session as the UI should currently show it
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: AiringPhase,
    pub field: Option<FieldName>,
    pub remaining_ticks: u32,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            phase: AiringPhase::Normal,
            field: None,
            remaining_ticks: 0,
        }
    }
}

/// Full state snapshot returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub fields: BTreeMap<FieldName, FieldView>,
    pub session: SessionView,
}

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes.
pub struct SharedState {
    fields: RwLock<BTreeMap<FieldName, FieldView>>,
    session: RwLock<SessionView>,
    event_bus: EventBus,
}

impl SharedState {
    /// Create new shared state with every field hidden
    pub fn new() -> Self {
        let mut fields = BTreeMap::new();
        for field in FieldName::all() {
            fields.insert(field, FieldView::default());
        }
        Self {
            fields: RwLock::new(fields),
            session: RwLock::new(SessionView::default()),
            event_bus: EventBus::new(256),
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: OnAirEvent) {
        self.event_bus.emit_lossy(event);
    }

    /// Subscribe to the event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<OnAirEvent> {
        self.event_bus.subscribe()
    }

    /// Full snapshot for the status endpoint
    pub async fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            fields: self.fields.read().await.clone(),
            session: self.session.read().await.clone(),
        }
    }

    /// Current view of one field
    pub async fn field_view(&self, field: FieldName) -> FieldView {
        self.fields
            .read()
            .await
            .get(&field)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the view of one field
    pub async fn set_field_view(&self, field: FieldName, view: FieldView) {
        self.fields.write().await.insert(field, view);
    }

    /// Current session view
    pub async fn session_view(&self) -> SessionView {
        self.session.read().await.clone()
    }

    /// Replace the session view
    pub async fn set_session_view(&self, view: SessionView) {
        *self.session.write().await = view;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
