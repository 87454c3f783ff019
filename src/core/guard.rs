//! Guard predicates for selecting mutations.
//!
//! Guards are pure boolean functions. Bindings use them as their `when`
//! clause to decide which committed mutations they react to.

use super::mutation::MutationOutcome;
use super::state::Feature;
use std::fmt;
use std::sync::Arc;

/// Pure predicate over values of type `T`.
///
/// # Example
///
/// ```rust
/// use featurestore::core::Guard;
///
/// let even = Guard::new(|n: &u32| n % 2 == 0);
///
/// assert!(even.check(&4));
/// assert!(!even.check(&3));
/// ```
pub struct Guard<T> {
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Guard<T> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe (Send + Sync).
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Check if the guard accepts this value.
    pub fn check(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    /// Guard accepting values both guards accept.
    pub fn and(self, other: Guard<T>) -> Guard<T>
    where
        T: 'static,
    {
        Guard::new(move |value: &T| self.check(value) && other.check(value))
    }

    /// Guard accepting values either guard accepts.
    pub fn or(self, other: Guard<T>) -> Guard<T>
    where
        T: 'static,
    {
        Guard::new(move |value: &T| self.check(value) || other.check(value))
    }
}

impl<T> Clone for Guard<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T> fmt::Debug for Guard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}

impl Guard<MutationOutcome> {
    /// Any mutation of feature `F`.
    pub fn touches<F: Feature>() -> Self {
        Guard::new(|outcome: &MutationOutcome| outcome.key().is::<F>())
    }

    /// Initialization of feature `F`.
    pub fn initialized<F: Feature>() -> Self {
        Guard::new(|outcome: &MutationOutcome| {
            outcome.key().is::<F>() && matches!(outcome, MutationOutcome::Initialization { .. })
        })
    }

    /// Deinitialization of feature `F`.
    pub fn deinitialized<F: Feature>() -> Self {
        Guard::new(|outcome: &MutationOutcome| {
            outcome.key().is::<F>() && matches!(outcome, MutationOutcome::Deinitialization { .. })
        })
    }

    /// Transition of feature `F` into `variant`.
    pub fn transitioned_to<F: Feature>(variant: &'static str) -> Self {
        Guard::new(move |outcome: &MutationOutcome| match outcome {
            MutationOutcome::Transition { new, .. } => {
                new.key().is::<F>() && new.variant() == variant
            }
            _ => false,
        })
    }
}
