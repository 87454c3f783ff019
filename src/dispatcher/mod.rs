//! Transaction coordination and change notification.
//!
//! A [`Dispatcher`] owns the externally visible [`Store`]. All writes go
//! through a transaction: `start` snapshots the store, `access` runs
//! handlers against a private working copy, and `commit` swaps the working
//! copy in and broadcasts a [`Report`] of the mutations in the order they
//! were applied. `reject` discards the working copy and restores the
//! snapshot. Only one transaction may be active at a time.
//!
//! # Example
//!
//! ```rust
//! use featurestore::core::{Store, StoreError};
//! use featurestore::dispatcher::{Dispatcher, Origin};
//! use featurestore::{feature, feature_state};
//!
//! feature_state! {
//!     enum CounterState {
//!         Stopped,
//!         Running { ticks: u32 },
//!     }
//! }
//!
//! feature!(Counter => CounterState);
//!
//! let mut dispatcher = Dispatcher::new();
//!
//! let history = dispatcher
//!     .transact(Origin::new("boot"), |store: &mut Store| -> Result<(), StoreError> {
//!         store.initialize::<Counter>(CounterState::Stopped)?;
//!         store.transition::<Counter>(CounterState::Running { ticks: 0 }, Some("Stopped"))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(history.len(), 2);
//! assert_eq!(
//!     dispatcher.store().get::<Counter>(),
//!     Some(CounterState::Running { ticks: 0 })
//! );
//! ```

mod error;
mod notifier;
mod report;
mod transaction;

pub use error::DispatcherError;
pub use notifier::{Observer, SubscriptionId};
pub use report::Report;
pub use transaction::Origin;

use crate::builder::Binding;
use crate::core::{FeatureKey, MutationHistory, MutationOutcome, Store};
use crate::enforcement::{CommitContext, CommitRules, ViolationStrategy};
use notifier::Notifier;
use std::convert::Infallible;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use transaction::Transaction;

/// What `transact_with` does after rejecting a failed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return the error to the caller
    #[default]
    Propagate,

    /// Panic once the rejection report has been broadcast
    Assert,
}

/// Single-writer transaction coordinator over a [`Store`].
#[derive(Default)]
pub struct Dispatcher {
    store: Store,
    transaction: Option<Transaction>,
    notifier: Notifier,
    rules: Option<CommitRules>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every commit against `rules` before it becomes visible.
    pub fn with_rules(mut self, rules: CommitRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// The externally visible store. Writes of an active transaction are
    /// not visible here until it commits.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn is_transaction_active(&self) -> bool {
        self.transaction.is_some()
    }

    /// Origin of the active transaction, if any.
    pub fn active_origin(&self) -> Option<&Origin> {
        self.transaction.as_ref().map(|transaction| &transaction.origin)
    }

    /// Start a transaction.
    ///
    /// Fails with `AlreadyInProgress` if one is active; the active
    /// transaction is left untouched.
    pub fn start(&mut self, origin: Origin) -> Result<(), DispatcherError> {
        if let Some(active) = &self.transaction {
            warn!(active = %active.origin, requested = %origin, "transaction already in progress");
            return Err(DispatcherError::AlreadyInProgress {
                active: active.origin.clone(),
                requested: origin,
            });
        }

        debug!(%origin, "transaction started");
        self.transaction = Some(Transaction::begin(origin, &self.store));
        Ok(())
    }

    /// Run `handler` against the active transaction's working copy.
    ///
    /// A handler error is returned as `FailureDuringAccess` and leaves the
    /// transaction active, including any writes the handler made before
    /// failing.
    pub fn access<T, E, H>(&mut self, handler: H) -> Result<T, DispatcherError>
    where
        H: FnOnce(&mut Store) -> Result<T, E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let Some(transaction) = self.transaction.as_mut() else {
            warn!("access without an active transaction");
            return Err(DispatcherError::NoActiveTransaction);
        };

        handler(&mut transaction.working).map_err(|error| {
            let cause = error.into();
            debug!(origin = %transaction.origin, %cause, "failure during access");
            DispatcherError::FailureDuringAccess {
                origin: transaction.origin.clone(),
                cause,
            }
        })
    }

    /// Commit the active transaction and broadcast its report.
    ///
    /// On failure the transaction stays active so the caller can reject
    /// it. On success the drained history is returned.
    pub fn commit(&mut self, origin: Origin) -> Result<MutationHistory, DispatcherError> {
        let Some(mut transaction) = self.transaction.take() else {
            warn!(%origin, "commit without an active transaction");
            return Err(DispatcherError::NoActiveTransaction);
        };

        if self.store.reset_id() != transaction.reset_id() {
            warn!(%origin, "history reset while transaction was active");
            self.transaction = Some(transaction);
            return Err(DispatcherError::ConcurrentChangesDetected { origin });
        }

        if let Some(rules) = &self.rules {
            let context = CommitContext {
                origin: &origin,
                mutations: transaction.working.history(),
                store: &transaction.working,
                started_at: transaction.started_at,
            };
            let violations = rules.violations(&context);

            if !violations.is_empty() {
                match rules.violation_strategy() {
                    ViolationStrategy::Reject => {
                        warn!(%origin, count = violations.len(), "commit rules violated");
                        self.transaction = Some(transaction);
                        return Err(DispatcherError::RulesViolated { violations });
                    }
                    ViolationStrategy::IgnoreAndLog => {
                        for violation in &violations {
                            warn!(%origin, %violation, "commit rule violated, committing anyway");
                        }
                    }
                }
            }
        }

        let history = transaction.working.reset_history();
        self.store = transaction.working;

        let mutations: Vec<MutationOutcome> = history.outcomes().cloned().collect();
        for mutation in &mutations {
            if let MutationOutcome::Initialization { new } = mutation {
                self.notifier.install(new.key());
            }
        }

        let report = Report::committed(origin, mutations, self.store.snapshot());
        info!(origin = %report.origin, mutations = history.len(), "transaction committed");
        self.notifier.broadcast(&report);

        for mutation in report.mutations() {
            if let MutationOutcome::Deinitialization { old } = mutation {
                let key = old.key();
                if !self.store.contains(&key) {
                    self.notifier.teardown(&key);
                }
            }
        }

        Ok(history)
    }

    /// Discard the active transaction and broadcast a rejection report.
    pub fn reject(&mut self, origin: Origin, reason: impl Into<String>) -> Result<(), DispatcherError> {
        let Some(transaction) = self.transaction.take() else {
            warn!(%origin, "reject without an active transaction");
            return Err(DispatcherError::NoActiveTransaction);
        };

        self.store = transaction.snapshot;

        let report = Report::rejected(origin, reason, self.store.snapshot());
        info!(
            origin = %report.origin,
            reason = report.rejection().unwrap_or_default(),
            "transaction rejected"
        );
        self.notifier.broadcast(&report);
        Ok(())
    }

    /// Run `handler` in its own transaction, committing on success and
    /// rejecting on failure.
    pub fn transact<T, E, H>(&mut self, origin: Origin, handler: H) -> Result<MutationHistory, DispatcherError>
    where
        H: FnOnce(&mut Store) -> Result<T, E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.transact_with(origin, FailurePolicy::Propagate, handler)
    }

    /// [`transact`](Self::transact) with an explicit failure policy.
    ///
    /// A refused `start` is returned as is; the transaction already in
    /// progress is not rejected.
    pub fn transact_with<T, E, H>(
        &mut self,
        origin: Origin,
        policy: FailurePolicy,
        handler: H,
    ) -> Result<MutationHistory, DispatcherError>
    where
        H: FnOnce(&mut Store) -> Result<T, E>,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.start(origin.clone())?;

        let result = self
            .access(handler)
            .and_then(|_| self.commit(origin.clone()));

        match result {
            Ok(history) => Ok(history),
            Err(error) => {
                self.reject(origin.clone(), error.to_string())?;
                if policy == FailurePolicy::Assert {
                    panic!("transaction {origin} rejected: {error}");
                }
                Err(error)
            }
        }
    }

    /// Remove every feature in one transaction.
    pub fn reset(&mut self, origin: Origin) -> Result<MutationHistory, DispatcherError> {
        self.transact(origin, |store: &mut Store| {
            Ok::<_, Infallible>(store.remove_all())
        })
    }

    /// Drain the live store's history.
    ///
    /// A transaction active at this point can no longer commit.
    pub fn reset_history(&mut self) -> MutationHistory {
        if let Some(transaction) = &self.transaction {
            warn!(active = %transaction.origin, "history reset during an active transaction");
        }
        self.store.reset_history()
    }

    /// Subscribe an observer. Its bindings are read once, now.
    pub fn subscribe<O: Observer + 'static>(&mut self, observer: &Arc<O>) -> SubscriptionId {
        self.notifier.subscribe(observer)
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Number of subscribed observers still alive.
    pub fn observer_count(&self) -> usize {
        self.notifier.observer_count()
    }

    /// Bindings currently installed for the feature behind `key`.
    pub fn installed_bindings(&self, key: &FeatureKey) -> &[Binding] {
        self.notifier.installed(key)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("store", &self.store)
            .field("active", &self.active_origin())
            .field("notifier", &self.notifier)
            .field("rules", &self.rules.is_some())
            .finish()
    }
}
