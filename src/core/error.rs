//! Store error types.

use super::mutation::{ExpectedMutation, MutationOutcome};
use thiserror::Error;

/// The store's actual outcome disagrees with the caller's declared intent.
///
/// Raised before the write is applied, so the store is left untouched.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("semantic mismatch: expected {expected}, got {actual}")]
pub struct SemanticMismatch {
    pub expected: ExpectedMutation,
    pub actual: MutationOutcome,
}

/// Errors from typed reads that assert presence or a specific variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReadDataError {
    #[error("Feature '{feature}' is not initialized")]
    FeatureNotFound { feature: &'static str },

    #[error("Feature '{feature}' holds variant '{actual}', expected '{expected}'")]
    StateTypeMismatch {
        feature: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Any error a store operation can raise.
///
/// Convenient as the error type of transaction handlers that both read
/// and write.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error(transparent)]
    Semantic(#[from] SemanticMismatch),

    #[error(transparent)]
    Read(#[from] ReadDataError),
}
