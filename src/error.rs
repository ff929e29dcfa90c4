//! Error types for Prism.

use thiserror::Error;

/// Result type alias using Prism's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Prism operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid filter configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Caps negotiation failed.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] crate::negotiation::NegotiationError),

    /// Acceleration device reported a failure.
    #[error("device error: {0}")]
    Device(String),

    /// Model or label file could not be loaded.
    #[error("model load failed: {0}")]
    ModelLoad(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
