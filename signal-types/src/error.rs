//! Error types for the signaling wire format.

use thiserror::Error;

/// Errors that can occur encoding or decoding wire messages.
#[derive(Debug, Error)]
pub enum SignalError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}
