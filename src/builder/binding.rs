//! Bindings: reactions to committed mutations.

use crate::builder::error::BuildError;
use crate::core::{Guard, MutationOutcome, StoreSnapshot};
use std::fmt;
use std::sync::Arc;

type Action = Arc<dyn Fn(&MutationOutcome, &StoreSnapshot) -> bool + Send + Sync>;

/// Type alias for binding transforms.
type Transform<T> = Arc<dyn Fn(&MutationOutcome, &StoreSnapshot) -> Option<T> + Send + Sync>;

/// Type alias for binding callbacks.
type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// A `(when, given, then)` reaction to committed mutations.
///
/// For each mutation of a commit, in order: if `when` accepts it, `given`
/// turns it (and the post-commit snapshot) into a value, and `then` is
/// called with that value. A `given` returning `None` skips the callback.
#[derive(Clone)]
pub struct Binding {
    description: String,
    when: Guard<MutationOutcome>,
    action: Action,
}

impl Binding {
    /// Start building a binding.
    pub fn builder(description: impl Into<String>) -> BindingBuilder {
        BindingBuilder::new(description)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evaluate the binding against one mutation.
    ///
    /// Returns whether the callback ran.
    pub fn evaluate(&self, mutation: &MutationOutcome, snapshot: &StoreSnapshot) -> bool {
        self.when.check(mutation) && (self.action)(mutation, snapshot)
    }

    /// Evaluate the binding against every mutation, in order.
    ///
    /// Returns how many times the callback ran.
    pub fn apply(&self, mutations: &[MutationOutcome], snapshot: &StoreSnapshot) -> usize {
        mutations
            .iter()
            .filter(|mutation| self.evaluate(mutation, snapshot))
            .count()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing bindings with a fluent API.
///
/// # Example
///
/// ```rust
/// use featurestore::builder::BindingBuilder;
/// use featurestore::core::MutationOutcome;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// let binding = BindingBuilder::new("log removals")
///     .when(|m: &MutationOutcome| matches!(m, MutationOutcome::Deinitialization { .. }))
///     .given(|m, _snapshot| Some(m.key().name()))
///     .then(move |name| sink.lock().unwrap().push(name))
///     .build()
///     .unwrap();
///
/// assert_eq!(binding.description(), "log removals");
/// ```
pub struct BindingBuilder<T = MutationOutcome> {
    description: String,
    when: Option<Guard<MutationOutcome>>,
    given: Transform<T>,
    then: Option<Callback<T>>,
}

impl BindingBuilder<MutationOutcome> {
    /// Create a new binding builder.
    ///
    /// Until [`given`](Self::given) is called, the callback receives the
    /// mutation itself.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            when: None,
            given: Arc::new(|mutation: &MutationOutcome, _: &StoreSnapshot| Some(mutation.clone())),
            then: None,
        }
    }
}

impl Default for BindingBuilder<MutationOutcome> {
    fn default() -> Self {
        Self::new("")
    }
}

impl<T: 'static> BindingBuilder<T> {
    /// Set the predicate using a closure (required).
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&MutationOutcome) -> bool + Send + Sync + 'static,
    {
        self.when = Some(Guard::new(predicate));
        self
    }

    /// Set the predicate from a guard (required).
    pub fn guard(mut self, guard: Guard<MutationOutcome>) -> Self {
        self.when = Some(guard);
        self
    }

    /// Set the transform (optional).
    ///
    /// Changes the value handed to the callback, so a callback set earlier
    /// is discarded.
    pub fn given<U, F>(self, transform: F) -> BindingBuilder<U>
    where
        F: Fn(&MutationOutcome, &StoreSnapshot) -> Option<U> + Send + Sync + 'static,
    {
        BindingBuilder {
            description: self.description,
            when: self.when,
            given: Arc::new(transform),
            then: None,
        }
    }

    /// Set the callback (required).
    pub fn then<F>(mut self, callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.then = Some(Arc::new(callback));
        self
    }

    /// Build the binding.
    pub fn build(self) -> Result<Binding, BuildError> {
        let when = self.when.ok_or(BuildError::MissingPredicate)?;
        let then = self.then.ok_or(BuildError::MissingCallback)?;
        Ok(assemble(self.description, when, self.given, then))
    }
}

/// Join the parts of a binding into its type-erased form.
pub(super) fn assemble<T: 'static>(
    description: String,
    when: Guard<MutationOutcome>,
    given: Transform<T>,
    then: Callback<T>,
) -> Binding {
    let action = move |mutation: &MutationOutcome, snapshot: &StoreSnapshot| {
        match given(mutation, snapshot) {
            Some(value) => {
                then(value);
                true
            }
            None => false,
        }
    };

    Binding {
        description,
        when,
        action: Arc::new(action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Feature, FeatureKey, State, StateValue};
    use serde::{Deserialize, Serialize};
    use std::sync::Mutex;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Loading,
        Ready { items: u32 },
    }

    impl State for TestState {
        fn variant(&self) -> &'static str {
            match self {
                Self::Loading => "Loading",
                Self::Ready { .. } => "Ready",
            }
        }
    }

    struct Feed;

    impl Feature for Feed {
        type State = TestState;
    }

    fn ready(items: u32) -> StateValue {
        StateValue::new::<Feed>(TestState::Ready { items })
    }

    #[test]
    fn builder_validates_missing_predicate() {
        let result = BindingBuilder::new("no predicate").then(|_| {}).build();
        assert!(matches!(result, Err(BuildError::MissingPredicate)));
    }

    #[test]
    fn builder_validates_missing_callback() {
        let result = BindingBuilder::new("no callback").when(|_| true).build();
        assert!(matches!(result, Err(BuildError::MissingCallback)));
    }

    #[test]
    fn given_discards_earlier_callback() {
        let result = BindingBuilder::new("reordered")
            .when(|_| true)
            .then(|_| {})
            .given(|m, _| Some(m.kind()))
            .build();

        assert!(matches!(result, Err(BuildError::MissingCallback)));
    }

    #[test]
    fn binding_fires_for_matching_mutations_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let binding = BindingBuilder::new("ready counts")
            .guard(Guard::touches::<Feed>())
            .given(|m, _| m.current_state::<Feed>().cloned())
            .then(move |state| {
                if let TestState::Ready { items } = state {
                    sink.lock().unwrap().push(items);
                }
            })
            .build()
            .unwrap();

        let mutations = vec![
            MutationOutcome::Initialization { new: ready(1) },
            MutationOutcome::Actualization {
                old: ready(1),
                new: ready(2),
            },
            MutationOutcome::Deinitialization { old: ready(2) },
        ];

        let fired = binding.apply(&mutations, &StoreSnapshot::default());

        assert_eq!(fired, 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn predicate_filters_mutations() {
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);

        let binding = BindingBuilder::new("removals only")
            .when(|m| matches!(m, MutationOutcome::NothingToRemove { .. }))
            .then(move |_| *counter.lock().unwrap() += 1)
            .build()
            .unwrap();

        let absent = MutationOutcome::NothingToRemove {
            key: FeatureKey::of::<Feed>(),
        };
        let initialized = MutationOutcome::Initialization { new: ready(1) };

        assert!(binding.evaluate(&absent, &StoreSnapshot::default()));
        assert!(!binding.evaluate(&initialized, &StoreSnapshot::default()));
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
