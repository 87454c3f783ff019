//! Build errors for binding builders.

use thiserror::Error;

/// Errors that can occur when building bindings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Binding predicate not specified. Call .when(predicate) before .build()")]
    MissingPredicate,

    #[error("Binding callback not specified. Call .then(callback) before .build()")]
    MissingCallback,
}
