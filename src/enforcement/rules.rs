//! Commit rules evaluated with Validation.

use crate::enforcement::context::CommitContext;
use crate::enforcement::violations::{ViolationError, ViolationStrategy};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// A custom commit check
pub type CommitCheck =
    Box<dyn Fn(&CommitContext<'_>) -> Validation<(), NonEmptyVec<ViolationError>> + Send + Sync>;

/// Rules a transaction must satisfy before it commits.
pub struct CommitRules {
    pub(crate) max_mutations: Option<usize>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) required_checks: Vec<CommitCheck>,
    pub(crate) on_violation: ViolationStrategy,
}

type Checked = Validation<(), NonEmptyVec<ViolationError>>;

fn within<T: PartialOrd>(value: T, limit: T, violation: impl FnOnce() -> ViolationError) -> Checked {
    if value > limit {
        Validation::fail(violation())
    } else {
        Validation::success(())
    }
}

impl CommitRules {
    /// Check the commit against every rule.
    ///
    /// All violated rules are reported together, built-in limits first and
    /// custom checks in the order they were added.
    pub fn enforce(&self, context: &CommitContext<'_>) -> Checked {
        let mutations = context.mutations.len();
        let elapsed = context.elapsed();

        let limits = [
            self.max_mutations.map(|max| {
                within(mutations, max, || ViolationError::MaxMutationsExceeded {
                    max,
                    current: mutations,
                })
            }),
            self.timeout.map(|timeout| {
                within(elapsed, timeout, || ViolationError::TimeoutExceeded { timeout, elapsed })
            }),
        ];

        let checks: Vec<Checked> = limits
            .into_iter()
            .flatten()
            .chain(self.required_checks.iter().map(|check| check(context)))
            .collect();

        if checks.is_empty() {
            return Validation::success(());
        }
        Validation::all_vec(checks).map(|_| ())
    }

    /// Violated rules as a plain list; empty when the commit may proceed.
    pub fn violations(&self, context: &CommitContext<'_>) -> Vec<ViolationError> {
        match self.enforce(context) {
            Validation::Success(_) => Vec::new(),
            Validation::Failure(errors) => errors.iter().cloned().collect(),
        }
    }

    pub fn violation_strategy(&self) -> ViolationStrategy {
        self.on_violation
    }
}
