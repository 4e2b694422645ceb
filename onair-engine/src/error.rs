//! Error types for onair-engine
//!
//! Module-specific error taxonomy using thiserror. Every failure path
//! returns the affected state machine to NORMAL; nothing here is fatal.

use crate::store::StoreError;
use onair_common::FieldName;
use thiserror::Error;

/// Main error type for the sync engine
#[derive(Error, Debug)]
pub enum Error {
    /// Toggle blocked because required content is absent
    #[error("Content rejected: {field} requires content before going live")]
    ContentRejected { field: FieldName },

    /// Toggle arrived while a write for the same field is still settling
    #[error("Busy: {field} has a write in flight")]
    Busy { field: FieldName },

    /// Countdown start blocked because the primary field's content is blank
    #[error("Missing content: {field} cannot be aired without content")]
    MissingContent { field: FieldName },

    /// Cancel requested while no countdown is running
    #[error("No countdown in progress")]
    NotCounting,

    /// Airing session already counting down or writing
    #[error("Airing session busy: {0}")]
    SessionBusy(String),

    /// Remote document store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
