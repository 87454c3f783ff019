//! The type-keyed state store.
//!
//! A [`Store`] maps each initialized feature to exactly one [`StateValue`]
//! and keeps a history of the mutations applied since the last drain.
//! Every write is classified first, validated against the caller's intent
//! second, and applied only if validation passes.

use super::error::{ReadDataError, SemanticMismatch};
use super::history::MutationHistory;
use super::mutation::{ExpectedMutation, MutationOutcome};
use super::state::{Feature, FeatureKey, State, StateValue};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Mapping from feature to its current value, plus mutation history.
///
/// Absence is not an error: [`get`](Self::get) and [`has`](Self::has) never
/// fail. Only the typed fetches that assert presence or a variant do.
///
/// # Example
///
/// ```rust
/// use featurestore::core::{Feature, MutationOutcome, State, Store};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum CartState {
///     Empty,
///     Filled { items: u32 },
/// }
///
/// impl State for CartState {
///     fn variant(&self) -> &'static str {
///         match self {
///             Self::Empty => "Empty",
///             Self::Filled { .. } => "Filled",
///         }
///     }
/// }
///
/// struct Cart;
///
/// impl Feature for Cart {
///     type State = CartState;
/// }
///
/// let mut store = Store::new();
///
/// let first = store.initialize::<Cart>(CartState::Empty).unwrap();
/// assert!(matches!(first, MutationOutcome::Initialization { .. }));
///
/// // Writing the same variant again is not an initialization.
/// assert!(store.initialize::<Cart>(CartState::Empty).is_err());
///
/// let next = store.transition::<Cart>(CartState::Filled { items: 1 }, Some("Empty")).unwrap();
/// assert!(matches!(next, MutationOutcome::Transition { .. }));
/// assert_eq!(store.get::<Cart>(), Some(CartState::Filled { items: 1 }));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Store {
    data: BTreeMap<FeatureKey, StateValue>,
    history: MutationHistory,
    reset_id: Uuid,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            history: MutationHistory::new(),
            reset_id: Uuid::new_v4(),
        }
    }

    /// Current state of feature `F`, if initialized.
    pub fn get<F: Feature>(&self) -> Option<F::State> {
        self.data
            .get(&FeatureKey::of::<F>())
            .and_then(StateValue::downcast::<F>)
            .cloned()
    }

    /// Check whether feature `F` is initialized.
    pub fn has<F: Feature>(&self) -> bool {
        self.contains(&FeatureKey::of::<F>())
    }

    pub fn get_value(&self, key: &FeatureKey) -> Option<&StateValue> {
        self.data.get(key)
    }

    pub fn contains(&self, key: &FeatureKey) -> bool {
        self.data.contains_key(key)
    }

    /// Current state of feature `F`, failing if it is not initialized.
    pub fn fetch<F: Feature>(&self) -> Result<F::State, ReadDataError> {
        self.get::<F>().ok_or(ReadDataError::FeatureNotFound {
            feature: F::name(),
        })
    }

    /// Current state of feature `F`, failing unless it holds `variant`.
    pub fn fetch_variant<F: Feature>(&self, variant: &'static str) -> Result<F::State, ReadDataError> {
        let state = self.fetch::<F>()?;
        let actual = state.variant();
        if actual != variant {
            return Err(ReadDataError::StateTypeMismatch {
                feature: F::name(),
                expected: variant,
                actual,
            });
        }
        Ok(state)
    }

    /// Keys of all initialized features, ordered by name.
    pub fn all_keys(&self) -> Vec<FeatureKey> {
        self.data.keys().copied().collect()
    }

    /// Values of all initialized features, ordered by feature name.
    pub fn all_values(&self) -> Vec<StateValue> {
        self.data.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write `state` for feature `F`, validated against `expected`.
    pub fn write<F: Feature>(
        &mut self,
        state: F::State,
        expected: ExpectedMutation,
    ) -> Result<MutationOutcome, SemanticMismatch> {
        self.write_value(StateValue::new::<F>(state), expected)
    }

    /// Write a type-erased value, validated against `expected`.
    ///
    /// The store is left untouched when validation fails.
    pub fn write_value(
        &mut self,
        value: StateValue,
        expected: ExpectedMutation,
    ) -> Result<MutationOutcome, SemanticMismatch> {
        let key = value.key();
        let outcome = MutationOutcome::classify(self.data.get(&key).cloned(), value.clone());

        if let Err(mismatch) = expected.validate(&outcome) {
            debug!(feature = key.name(), %expected, actual = outcome.kind(), "write rejected");
            return Err(mismatch);
        }

        self.data.insert(key, value);
        debug!(feature = key.name(), kind = outcome.kind(), "state written");
        self.history.record(outcome.clone());
        Ok(outcome)
    }

    /// Write a first value for feature `F`.
    pub fn initialize<F: Feature>(&mut self, state: F::State) -> Result<MutationOutcome, SemanticMismatch> {
        self.write::<F>(state, ExpectedMutation::Initialization)
    }

    /// Replace feature `F`'s value with one of the same variant.
    pub fn actualize<F: Feature>(&mut self, state: F::State) -> Result<MutationOutcome, SemanticMismatch> {
        self.write::<F>(state, ExpectedMutation::Actualization)
    }

    /// Move feature `F` to a different variant, optionally asserting the
    /// variant it leaves.
    ///
    /// Writing the variant the feature already holds is accepted and
    /// classified as an actualization.
    pub fn transition<F: Feature>(
        &mut self,
        state: F::State,
        from: Option<&'static str>,
    ) -> Result<MutationOutcome, SemanticMismatch> {
        let key = FeatureKey::of::<F>();
        let expected = match self.data.get(&key) {
            Some(current)
                if current.variant() == state.variant()
                    && from.map_or(true, |from| from == current.variant()) =>
            {
                debug!(feature = key.name(), variant = current.variant(), "transition into same variant");
                ExpectedMutation::Actualization
            }
            _ => ExpectedMutation::Transition { from },
        };
        self.write::<F>(state, expected)
    }

    /// Remove feature `F`. See [`remove_key`](Self::remove_key).
    pub fn deinitialize<F: Feature>(
        &mut self,
        from: Option<&'static str>,
        strict: bool,
    ) -> Result<MutationOutcome, SemanticMismatch> {
        self.remove_key(&FeatureKey::of::<F>(), from, strict)
    }

    /// Remove feature `F`. Alias of [`deinitialize`](Self::deinitialize).
    pub fn remove<F: Feature>(
        &mut self,
        from: Option<&'static str>,
        strict: bool,
    ) -> Result<MutationOutcome, SemanticMismatch> {
        self.deinitialize::<F>(from, strict)
    }

    /// Remove the value held under `key`.
    ///
    /// A present value yields a deinitialization. An absent one yields
    /// `NothingToRemove`, which is only accepted when `strict` is false and
    /// no source variant was asserted.
    pub fn remove_key(
        &mut self,
        key: &FeatureKey,
        from: Option<&'static str>,
        strict: bool,
    ) -> Result<MutationOutcome, SemanticMismatch> {
        let expected = ExpectedMutation::Deinitialization { from, strict };
        let outcome = match self.data.get(key) {
            Some(old) => MutationOutcome::Deinitialization { old: old.clone() },
            None => MutationOutcome::NothingToRemove { key: *key },
        };

        if let Err(mismatch) = expected.validate(&outcome) {
            debug!(feature = key.name(), %expected, actual = outcome.kind(), "removal rejected");
            return Err(mismatch);
        }

        self.data.remove(key);
        debug!(feature = key.name(), kind = outcome.kind(), "state removed");
        self.history.record(outcome.clone());
        Ok(outcome)
    }

    /// Remove every initialized feature, one deinitialization per key.
    pub fn remove_all(&mut self) -> Vec<MutationOutcome> {
        let keys = self.all_keys();
        let mut removed = Vec::with_capacity(keys.len());
        for key in &keys {
            match self.remove_key(key, None, false) {
                Ok(outcome) => removed.push(outcome),
                Err(mismatch) => warn!(feature = key.name(), %mismatch, "feature kept by remove_all"),
            }
        }
        removed
    }

    /// Mutations applied since the last drain.
    pub fn history(&self) -> &MutationHistory {
        &self.history
    }

    /// Token identifying the current history generation.
    pub fn reset_id(&self) -> Uuid {
        self.reset_id
    }

    /// Drain the history and rotate the reset id.
    pub fn reset_history(&mut self) -> MutationHistory {
        self.reset_id = Uuid::new_v4();
        std::mem::take(&mut self.history)
    }

    /// Copy of the current contents, without history.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            states: self.data.clone(),
        }
    }
}

/// Immutable copy of a store's contents.
///
/// Serializes as a map from feature name to value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreSnapshot {
    states: BTreeMap<FeatureKey, StateValue>,
}

impl StoreSnapshot {
    pub fn get<F: Feature>(&self) -> Option<&F::State> {
        self.states
            .get(&FeatureKey::of::<F>())
            .and_then(StateValue::downcast::<F>)
    }

    pub fn has<F: Feature>(&self) -> bool {
        self.states.contains_key(&FeatureKey::of::<F>())
    }

    pub fn get_value(&self, key: &FeatureKey) -> Option<&StateValue> {
        self.states.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FeatureKey> + '_ {
        self.states.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &StateValue> + '_ {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// A name carried by more than one feature in this snapshot, if any.
    ///
    /// Exports key values by name, so such a snapshot cannot be exported.
    pub fn shared_name(&self) -> Option<&'static str> {
        self.states
            .keys()
            .zip(self.states.keys().skip(1))
            .find(|(a, b)| a.name() == b.name())
            .map(|(a, _)| a.name())
    }
}

impl Serialize for StoreSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(name) = self.shared_name() {
            return Err(S::Error::custom(format!("feature name '{name}' is shared by several features")));
        }
        serializer.collect_map(self.states.iter().map(|(key, value)| (key.name(), value)))
    }
}
