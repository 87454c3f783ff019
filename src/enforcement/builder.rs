//! Fluent construction of commit rules.

use crate::core::{Feature, MutationOutcome};
use crate::enforcement::context::CommitContext;
use crate::enforcement::rules::{CommitCheck, CommitRules};
use crate::enforcement::violations::{ViolationError, ViolationStrategy};
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Builder for [`CommitRules`]. Nothing is checked unless configured.
#[derive(Default)]
pub struct RulesBuilder {
    max_mutations: Option<usize>,
    timeout: Option<Duration>,
    checks: Vec<CommitCheck>,
    strategy: ViolationStrategy,
}

impl RulesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse commits carrying more than `n` mutations.
    pub fn max_mutations(mut self, n: usize) -> Self {
        self.max_mutations = Some(n);
        self
    }

    /// Refuse commits of transactions open longer than `duration`.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Add a check that reports its own violations.
    pub fn require<C>(mut self, check: C) -> Self
    where
        C: Fn(&CommitContext<'_>) -> Validation<(), NonEmptyVec<ViolationError>> + Send + Sync + 'static,
    {
        self.checks.push(Box::new(check));
        self
    }

    /// Add a yes/no check; `message` becomes the violation when it says no.
    pub fn require_pred<P>(self, predicate: P, message: String) -> Self
    where
        P: Fn(&CommitContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.require(move |ctx: &CommitContext<'_>| {
            if predicate(ctx) {
                Validation::success(())
            } else {
                Validation::fail(ViolationError::CustomCheckFailed {
                    message: message.clone(),
                })
            }
        })
    }

    /// Require feature `F` to be initialized once the commit lands.
    pub fn require_feature<F: Feature>(self) -> Self {
        self.require_pred(
            |ctx| ctx.store.has::<F>(),
            format!("Feature '{}' must stay initialized", F::name()),
        )
    }

    /// Refuse commits that deinitialize feature `F`.
    pub fn forbid_removal<F: Feature>(self) -> Self {
        self.require_pred(
            |ctx| {
                !ctx.mutations.outcomes().any(|mutation| {
                    matches!(mutation, MutationOutcome::Deinitialization { old } if old.key().is::<F>())
                })
            },
            format!("Feature '{}' may not be removed", F::name()),
        )
    }

    /// What the dispatcher does when a rule is violated.
    pub fn on_violation(mut self, strategy: ViolationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> CommitRules {
        CommitRules {
            max_mutations: self.max_mutations,
            timeout: self.timeout,
            required_checks: self.checks,
            on_violation: self.strategy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Store;
    use crate::dispatcher::Origin;
    use chrono::Utc;

    crate::feature_state! {
        enum TestState {
            Active,
        }
    }

    crate::feature!(Account => TestState);

    fn violations(rules: &CommitRules, store: &Store) -> Vec<ViolationError> {
        let origin = Origin::new("test");
        let context = CommitContext {
            origin: &origin,
            mutations: store.history(),
            store,
            started_at: Utc::now(),
        };
        rules.violations(&context)
    }

    #[test]
    fn default_rules_reject_and_check_nothing() {
        let rules = RulesBuilder::new().build();

        assert_eq!(rules.violation_strategy(), ViolationStrategy::Reject);
        assert!(violations(&rules, &Store::new()).is_empty());
    }

    #[test]
    fn require_feature_checks_the_working_copy() {
        let rules = RulesBuilder::new().require_feature::<Account>().build();
        let mut store = Store::new();

        assert_eq!(
            violations(&rules, &store),
            vec![ViolationError::CustomCheckFailed {
                message: format!("Feature '{}' must stay initialized", Account::name())
            }]
        );

        store.initialize::<Account>(TestState::Active).unwrap();
        assert!(violations(&rules, &store).is_empty());
    }

    #[test]
    fn forbid_removal_looks_at_mutations() {
        let rules = RulesBuilder::new().forbid_removal::<Account>().build();
        let mut store = Store::new();
        store.initialize::<Account>(TestState::Active).unwrap();
        assert!(violations(&rules, &store).is_empty());

        store.remove::<Account>(None, true).unwrap();
        assert_eq!(violations(&rules, &store).len(), 1);
    }
}
