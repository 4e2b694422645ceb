//! On-air synchronization engine
//!
//! One sequential actor per document path owns every state machine: the
//! per-field sync controllers, the airing session, and the reconciliation
//! pass. Timers and in-flight writes report back into the actor's queue,
//! so no two transitions ever run concurrently.

pub mod controller;
pub mod engine;
pub mod reconcile;
pub mod session;
pub mod timers;

pub use controller::FieldSyncController;
pub use engine::{EngineHandle, SyncEngine};
pub use session::{AiringPhase, AiringSession};
