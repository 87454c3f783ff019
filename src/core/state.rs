//! Feature keys and the state values stored under them.
//!
//! A [`Feature`] is a type-level identity naming one slot of the store. Its
//! [`Feature::State`] enum lists every shape the slot may hold; the variant
//! tag returned by [`State::variant`] is what the store compares when it
//! classifies a write as an actualization or a transition.

use crate::builder::Binding;
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Trait for the values a feature can hold.
///
/// All methods are pure. Values are immutable snapshots: "mutating" a
/// feature always means replacing its value with a new one.
///
/// # Example
///
/// ```rust
/// use featurestore::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum SessionState {
///     Anonymous,
///     SignedIn { user: String },
/// }
///
/// impl State for SessionState {
///     fn variant(&self) -> &'static str {
///         match self {
///             Self::Anonymous => "Anonymous",
///             Self::SignedIn { .. } => "SignedIn",
///         }
///     }
/// }
///
/// let a = SessionState::SignedIn { user: "ann".into() };
/// let b = SessionState::SignedIn { user: "bob".into() };
/// assert!(a.same_variant(&b));
/// assert!(!a.same_variant(&SessionState::Anonymous));
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable discriminant of the current variant.
    ///
    /// Two values of the same type belong to the same variant iff their
    /// tags are equal.
    fn variant(&self) -> &'static str;

    /// Check whether `other` has the same variant tag.
    fn same_variant(&self, other: &Self) -> bool {
        self.variant() == other.variant()
    }
}

/// A logical slot of the store, identified by its type.
///
/// The feature type carries no runtime data. `F::State` is the only value
/// type that can be stored under `F`.
///
/// # Example
///
/// ```rust
/// use featurestore::core::{Feature, State};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum SearchState {
///     Idle,
///     Running { query: String },
/// }
///
/// impl State for SearchState {
///     fn variant(&self) -> &'static str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Running { .. } => "Running",
///         }
///     }
/// }
///
/// struct Search;
///
/// impl Feature for Search {
///     type State = SearchState;
///
///     fn name() -> &'static str {
///         "Search"
///     }
/// }
///
/// assert_eq!(Search::name(), "Search");
/// ```
pub trait Feature: 'static {
    /// The state enum held by this feature.
    type State: State;

    /// Stable name of the feature, used for logging, ordering and export.
    ///
    /// Defaults to the Rust type name.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Bindings that live as long as the feature is initialized.
    ///
    /// They are installed when a commit initializes the feature and torn
    /// down after the commit that deinitializes it has been broadcast.
    fn bindings() -> Vec<Binding> {
        Vec::new()
    }
}

/// Runtime identity of a [`Feature`].
///
/// Equality, ordering and hashing only consider the identity; keys sort by
/// feature name.
#[derive(Clone, Copy)]
pub struct FeatureKey {
    name: &'static str,
    type_id: TypeId,
    bindings: fn() -> Vec<Binding>,
}

impl FeatureKey {
    /// Key of feature `F`.
    pub fn of<F: Feature>() -> Self {
        Self {
            name: F::name(),
            type_id: TypeId::of::<F>(),
            bindings: F::bindings,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check if this key identifies feature `F`.
    pub fn is<F: Feature>(&self) -> bool {
        self.type_id == TypeId::of::<F>()
    }

    pub(crate) fn bindings(&self) -> Vec<Binding> {
        (self.bindings)()
    }
}

impl PartialEq for FeatureKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for FeatureKey {}

impl Hash for FeatureKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl PartialOrd for FeatureKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FeatureKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| self.type_id.cmp(&other.type_id))
    }
}

impl Debug for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FeatureKey").field(&self.name).finish()
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for FeatureKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// Object-safe view over any [`State`].
trait ErasedState: Any + Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn variant(&self) -> &'static str;
    fn eq_erased(&self, other: &dyn ErasedState) -> bool;
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<S: State> ErasedState for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn variant(&self) -> &'static str {
        State::variant(self)
    }

    fn eq_erased(&self, other: &dyn ErasedState) -> bool {
        other
            .as_any()
            .downcast_ref::<S>()
            .is_some_and(|other| other == self)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// An immutable, type-erased state value tagged with its feature.
///
/// Cloning is cheap: the underlying state is shared, which is what makes
/// store snapshots copy-on-write.
#[derive(Clone)]
pub struct StateValue {
    key: FeatureKey,
    state: Arc<dyn ErasedState>,
}

impl StateValue {
    /// Wrap a state of feature `F`.
    pub fn new<F: Feature>(state: F::State) -> Self {
        Self {
            key: FeatureKey::of::<F>(),
            state: Arc::new(state),
        }
    }

    pub fn key(&self) -> FeatureKey {
        self.key
    }

    /// Variant tag of the wrapped state.
    pub fn variant(&self) -> &'static str {
        self.state.variant()
    }

    /// Check whether both values belong to the same feature and variant.
    pub fn same_variant(&self, other: &StateValue) -> bool {
        self.key == other.key && self.variant() == other.variant()
    }

    /// Recover the typed state if this value belongs to feature `F`.
    pub fn downcast<F: Feature>(&self) -> Option<&F::State> {
        if !self.key.is::<F>() {
            return None;
        }
        self.state.as_any().downcast_ref::<F::State>()
    }

    /// JSON rendering of the wrapped state, for tooling.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        self.state.to_json()
    }
}

impl PartialEq for StateValue {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.state.eq_erased(other.state.as_ref())
    }
}

impl Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValue")
            .field("feature", &self.key.name)
            .field("state", &self.state)
            .finish()
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.key.name, self.variant())
    }
}

impl Serialize for StateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let state = self.to_json().map_err(serde::ser::Error::custom)?;
        let mut out = serializer.serialize_struct("StateValue", 3)?;
        out.serialize_field("feature", self.key.name)?;
        out.serialize_field("variant", self.variant())?;
        out.serialize_field("state", &state)?;
        out.end()
    }
}
