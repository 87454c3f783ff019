//! Violation errors and handling strategies.

use std::time::Duration;
use thiserror::Error;

/// A commit rule the working copy does not satisfy
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ViolationError {
    #[error("Maximum mutations ({max}) exceeded (current: {current})")]
    MaxMutationsExceeded { max: usize, current: usize },

    #[error("Timeout ({timeout:?}) exceeded (elapsed: {elapsed:?})")]
    TimeoutExceeded {
        timeout: Duration,
        elapsed: Duration,
    },

    #[error("Custom check failed: {message}")]
    CustomCheckFailed { message: String },
}

/// Strategy for handling rule violations at commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViolationStrategy {
    /// Refuse the commit; the transaction stays active
    #[default]
    Reject,

    /// Commit anyway but log a warning
    IgnoreAndLog,
}
