//! Context provided to commit rule checks.

use crate::core::{MutationHistory, Store};
use crate::dispatcher::Origin;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// What a transaction is about to commit.
#[derive(Clone, Copy, Debug)]
pub struct CommitContext<'a> {
    /// Who asked for the commit
    pub origin: &'a Origin,
    /// Mutations applied inside the transaction, in order
    pub mutations: &'a MutationHistory,
    /// The working copy that becomes visible if the commit goes through
    pub store: &'a Store,
    /// When the transaction started
    pub started_at: DateTime<Utc>,
}

impl CommitContext<'_> {
    /// Calculate elapsed time since the transaction started (pure)
    pub fn elapsed(&self) -> Duration {
        let now = Utc::now();
        now.signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
