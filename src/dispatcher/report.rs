//! Commit and reject reports.

use crate::core::{MutationOutcome, StoreSnapshot};
use crate::dispatcher::transaction::Origin;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What a transaction did, delivered to every subscriber.
///
/// A committed report carries the mutations in the order they were applied
/// and the store contents after the commit. A rejected one carries the
/// reason and the restored contents.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub origin: Origin,
    pub outcome: Result<Vec<MutationOutcome>, String>,
    pub snapshot: StoreSnapshot,
}

impl Report {
    pub fn committed(origin: Origin, mutations: Vec<MutationOutcome>, snapshot: StoreSnapshot) -> Self {
        Self {
            timestamp: Utc::now(),
            origin,
            outcome: Ok(mutations),
            snapshot,
        }
    }

    pub fn rejected(origin: Origin, reason: impl Into<String>, snapshot: StoreSnapshot) -> Self {
        Self {
            timestamp: Utc::now(),
            origin,
            outcome: Err(reason.into()),
            snapshot,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Committed mutations; empty for a rejection.
    pub fn mutations(&self) -> &[MutationOutcome] {
        match &self.outcome {
            Ok(mutations) => mutations,
            Err(_) => &[],
        }
    }

    pub fn rejection(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }

    /// Render the report as JSON for tooling.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
