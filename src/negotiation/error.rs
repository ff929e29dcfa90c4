//! Negotiation error types.

use crate::format::PixelFormat;
use thiserror::Error;

/// Error during caps negotiation.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// A capability set that must hold at least one descriptor is empty.
    #[error("empty capability set: {context}")]
    EmptyCapsSet {
        /// Which set was empty (for logs).
        context: &'static str,
    },

    /// No candidate format is reachable from the input at finite cost.
    #[error("no acceptable output format for input {input}")]
    NoAcceptableFormat {
        /// Fixed input pixel format.
        input: PixelFormat,
    },

    /// A constraint range has min above max and cannot be fixated.
    #[error("degenerate range for field `{field}`")]
    DegenerateRange {
        /// Name of the offending caps field.
        field: &'static str,
    },

    /// The input caps are not fully fixed or not supported upstream.
    #[error("unsupported or unfixed input format: {detail}")]
    UnsupportedInputFormat {
        /// What is missing or unsupported.
        detail: String,
    },

    /// Internal error.
    #[error("internal negotiation error: {0}")]
    Internal(String),
}
