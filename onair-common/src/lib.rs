//! # On-Air Common Library
//!
//! Shared code for the on-air graphics services including:
//! - Live field model (field names, content, document shape)
//! - Content gate and mutual exclusion policy
//! - Event types (OnAirEvent enum) and EventBus
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod fields;
pub mod policy;

pub use error::{Error, Result};
pub use fields::{FieldContent, FieldName, FieldState};
