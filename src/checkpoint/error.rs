//! Checkpoint error types.

use thiserror::Error;

/// Errors raised while exporting, importing or restoring a checkpoint
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckpointError {
    /// Encoding a state or the checkpoint itself failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Decoding the checkpoint or one of its payloads failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Unsupported checkpoint version {found}, supported: {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Checkpoint contents disagree with the feature they are read into
    #[error("Checkpoint validation failed: {0}")]
    ValidationFailed(String),
}
