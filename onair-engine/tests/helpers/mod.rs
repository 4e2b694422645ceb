//! Shared test harness for the engine integration suites
//!
//! Starts a full engine against the in-memory store. Suites run with
//! `#[tokio::test(start_paused = true)]` so settle windows and countdown
//! ticks elapse via the paused clock's auto-advance instead of wall time.

#![allow(dead_code)]

use onair_common::document::OnAirDocument;
use onair_common::events::OnAirEvent;
use onair_engine::config::Config;
use onair_engine::state::SharedState;
use onair_engine::store::MemoryDocumentStore;
use onair_engine::sync::{EngineHandle, SyncEngine};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub const DOC_PATH: &str = "onair/current";

/// Default timing used by the suites: 2s settle window, 4-tick countdown
pub fn test_config() -> Config {
    Config {
        document_path: DOC_PATH.to_string(),
        settle_window_ms: 2000,
        countdown_ticks: 4,
        tick_interval_ms: 1000,
        ..Config::default()
    }
}

/// Start an engine over a fresh hidden document
pub async fn start_engine() -> (MemoryDocumentStore, Arc<SharedState>, EngineHandle) {
    start_engine_with(test_config()).await
}

pub async fn start_engine_with(
    config: Config,
) -> (MemoryDocumentStore, Arc<SharedState>, EngineHandle) {
    let store = MemoryDocumentStore::new();
    store.seed(DOC_PATH, OnAirDocument::hidden());
    start_engine_on(store, config).await
}

/// Start an engine over a pre-seeded store
pub async fn start_engine_on(
    store: MemoryDocumentStore,
    config: Config,
) -> (MemoryDocumentStore, Arc<SharedState>, EngineHandle) {
    let shared = Arc::new(SharedState::new());
    let engine = SyncEngine::start(Arc::new(store.clone()), config, shared.clone())
        .await
        .expect("engine should start");
    (store, shared, engine)
}

/// Poll until `cond` holds, letting paused time advance between polls
pub async fn eventually<F, Fut>(mut cond: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            if cond().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not met before timeout");
}

/// Next event matching `pred`, skipping others
pub async fn expect_event<P>(rx: &mut broadcast::Receiver<OnAirEvent>, pred: P) -> OnAirEvent
where
    P: Fn(&OnAirEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("event stream ended: {}", e),
            }
        }
    })
    .await
    .expect("expected event not received before timeout")
}

/// Let the engine drain already-queued commands without advancing time
pub async fn drain_queue() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}
