//! In-process document store
//!
//! Backs local runs and the test suites. Mimics the production store's
//! observable behavior: merge-writes, full-snapshot push notifications in
//! write order, and a bootstrap snapshot as the first delivery after
//! subscribing. Also records every write and supports injected write
//! failure so failure paths can be exercised deterministically.

use super::{StoreError, Subscription};
use onair_common::document::{DocumentPatch, OnAirDocument};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

/// Shared in-memory document store
#[derive(Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

struct Inner {
    docs: Mutex<HashMap<String, OnAirDocument>>,
    channels: Mutex<HashMap<String, broadcast::Sender<OnAirDocument>>>,
    write_log: Mutex<Vec<(String, DocumentPatch)>>,
    fail_next_write: Mutex<Option<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                docs: Mutex::new(HashMap::new()),
                channels: Mutex::new(HashMap::new()),
                write_log: Mutex::new(Vec::new()),
                fail_next_write: Mutex::new(None),
            }),
        }
    }

    /// Seed a document before the engine starts (test setup)
    pub fn seed(&self, path: &str, doc: OnAirDocument) {
        self.inner
            .docs
            .lock()
            .unwrap()
            .insert(path.to_string(), doc);
    }

    /// Current document snapshot without going through the trait
    pub fn document(&self, path: &str) -> OnAirDocument {
        self.inner
            .docs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    /// Every patch accepted so far, in write order
    pub fn writes(&self) -> Vec<(String, DocumentPatch)> {
        self.inner.write_log.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.write_log.lock().unwrap().len()
    }

    /// Make the next write fail with the given message
    pub fn fail_next_write(&self, message: &str) {
        *self.inner.fail_next_write.lock().unwrap() = Some(message.to_string());
    }

    /// Apply a patch as if another operator wrote it
    ///
    /// Same merge + notify path as [`DocumentStore::write`] but without
    /// touching the write log or the failure injection, so tests can
    /// distinguish engine-issued writes from external ones.
    pub fn external_write(&self, path: &str, patch: &DocumentPatch) {
        let snapshot = {
            let mut docs = self.inner.docs.lock().unwrap();
            let doc = docs.entry(path.to_string()).or_default();
            doc.apply(patch);
            doc.clone()
        };
        self.notify(path, snapshot);
    }

    fn sender(&self, path: &str) -> broadcast::Sender<OnAirDocument> {
        let mut channels = self.inner.channels.lock().unwrap();
        channels
            .entry(path.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    fn notify(&self, path: &str, snapshot: OnAirDocument) {
        // No receivers is fine; the snapshot is simply dropped
        let _ = self.sender(path).send(snapshot);
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl super::DocumentStore for MemoryDocumentStore {
    async fn read(&self, path: &str) -> Result<Option<OnAirDocument>, StoreError> {
        Ok(self.inner.docs.lock().unwrap().get(path).cloned())
    }

    async fn write(&self, path: &str, patch: DocumentPatch) -> Result<(), StoreError> {
        if let Some(message) = self.inner.fail_next_write.lock().unwrap().take() {
            return Err(StoreError::Write(message));
        }

        let snapshot = {
            let mut docs = self.inner.docs.lock().unwrap();
            let doc = docs.entry(path.to_string()).or_default();
            doc.apply(&patch);
            doc.clone()
        };

        debug!(path, fields = patch.fields.len(), "Merge-write applied");
        self.inner
            .write_log
            .lock()
            .unwrap()
            .push((path.to_string(), patch));

        self.notify(path, snapshot);
        Ok(())
    }

    fn subscribe(&self, path: &str) -> Subscription {
        let rx = self.sender(path).subscribe();
        let initial = self.document(path);
        Subscription::new(initial, rx)
    }
}
