//! Dispatcher error types.

use crate::dispatcher::transaction::Origin;
use crate::enforcement::ViolationError;
use std::error::Error;
use thiserror::Error;

/// Errors surfaced by the transaction coordinator.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A transaction is already active; nested transactions are never queued
    #[error("Transaction {requested} refused: {active} is already in progress")]
    AlreadyInProgress { active: Origin, requested: Origin },

    #[error("No active transaction")]
    NoActiveTransaction,

    /// The live history was reset after the transaction started
    #[error("Concurrent changes detected while committing {origin}")]
    ConcurrentChangesDetected { origin: Origin },

    /// The access handler failed; the transaction is still active
    #[error("Failure during access in {origin}: {cause}")]
    FailureDuringAccess {
        origin: Origin,
        #[source]
        cause: Box<dyn Error + Send + Sync>,
    },

    #[error("Commit rules violated: {}", describe(violations))]
    RulesViolated { violations: Vec<ViolationError> },
}

impl DispatcherError {
    /// The handler error behind a `FailureDuringAccess`.
    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Self::FailureDuringAccess { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }

    /// Whether the error comes from misusing the coordinator rather than
    /// from the work done inside a transaction.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInProgress { .. }
                | Self::NoActiveTransaction
                | Self::ConcurrentChangesDetected { .. }
        )
    }
}

fn describe(violations: &[ViolationError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
