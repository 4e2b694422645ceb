//! HTTP API for the sync engine
//!
//! REST control endpoints plus an SSE event stream. The API is a thin
//! surface over [`EngineHandle`](crate::sync::EngineHandle); rendering of
//! the actual graphic happens in the external playout layer.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
