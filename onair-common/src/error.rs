//! Common error types for the on-air services

use thiserror::Error;

/// Common result type for on-air operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across on-air services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
