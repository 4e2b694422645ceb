//! On-Air Sync Engine (onair-engine)
//!
//! Keeps a local optimistic view of "what is currently live" consistent
//! with a remote, multi-writer, push-subscribed document while enforcing
//! the domain rules: no field airs without content, only one primary
//! overlay at a time, a pending go-live can be aborted within a grace
//! window, and changes made by another operator are adopted rather than
//! clobbered or looped back.
//!
//! # Architecture
//!
//! - **store**: the remote document contract (read / merge-write /
//!   subscribe) plus an in-process implementation.
//! - **sync**: the engine actor. One sequential command queue owns all
//!   per-field controllers, the airing session, and the reconciliation
//!   pass; timers and in-flight writes report back into the same queue.
//! - **api**: axum control surface (REST + SSE) over the engine handle.

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
