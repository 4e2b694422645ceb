//! Remote document store contract
//!
//! The playout layer renders whatever the shared remote document says is
//! live; this module defines the narrow interface the sync engine needs
//! from that store: point reads, merge-writes, and an ordered push
//! subscription. The store is assumed eventually consistent with
//! at-least-once notification delivery and no cross-path transactions.

mod memory;

pub use memory::MemoryDocumentStore;

use onair_common::document::{DocumentPatch, OnAirDocument};
use std::future::Future;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

/// Store failure taxonomy
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Merge-write was rejected or lost
    #[error("Write failed: {0}")]
    Write(String),

    /// Point read failed
    #[error("Read failed: {0}")]
    Read(String),

    /// Store unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Contract with the remote document collaborator
///
/// Writes have merge semantics: attributes the patch does not mention are
/// preserved, the document is never replaced wholesale. Retry/backoff is
/// the store implementation's concern, not the engine's.
pub trait DocumentStore: Send + Sync + 'static {
    /// Read the document at `path`, `None` when it does not exist yet
    fn read(
        &self,
        path: &str,
    ) -> impl Future<Output = std::result::Result<Option<OnAirDocument>, StoreError>> + Send;

    /// Merge `patch` into the document at `path`
    fn write(
        &self,
        path: &str,
        patch: DocumentPatch,
    ) -> impl Future<Output = std::result::Result<(), StoreError>> + Send;

    /// Subscribe to change notifications for `path`
    ///
    /// The first delivered snapshot is the current document (bootstrap
    /// read); subsequent snapshots arrive in write order, at least once.
    fn subscribe(&self, path: &str) -> Subscription;
}

/// Cancellable push subscription carrying full document snapshots
pub struct Subscription {
    initial: Option<OnAirDocument>,
    rx: broadcast::Receiver<OnAirDocument>,
}

impl Subscription {
    pub(crate) fn new(initial: OnAirDocument, rx: broadcast::Receiver<OnAirDocument>) -> Self {
        Self {
            initial: Some(initial),
            rx,
        }
    }

    /// Next document snapshot, or `None` once the store shuts down
    ///
    /// Lagged deliveries are skipped with a warning; the following
    /// snapshot carries the full current state, so nothing is lost
    /// beyond intermediate versions.
    pub async fn recv(&mut self) -> Option<OnAirDocument> {
        if let Some(doc) = self.initial.take() {
            return Some(doc);
        }
        loop {
            match self.rx.recv().await {
                Ok(doc) => return Some(doc),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Subscription lagged, skipping to latest snapshot");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Stop delivery
    pub fn cancel(self) {
        // Dropping the receiver detaches from the broadcast channel
    }
}
