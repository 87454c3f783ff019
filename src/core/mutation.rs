//! Mutation outcomes and the validator that checks them against intent.
//!
//! The store always *computes* the outcome of a write from what it already
//! holds. The caller's [`ExpectedMutation`] is only used to accept or reject
//! that outcome before anything is committed.

use super::error::SemanticMismatch;
use super::state::{Feature, FeatureKey, StateValue};
use serde::Serialize;
use std::fmt;

/// What a write or removal actually did to a feature.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The feature had no value and now holds `new`.
    Initialization { new: StateValue },

    /// The feature's value was replaced by one of the same variant.
    Actualization { old: StateValue, new: StateValue },

    /// The feature's value was replaced by one of a different variant.
    Transition { old: StateValue, new: StateValue },

    /// The feature's value was removed.
    Deinitialization { old: StateValue },

    /// Removal was requested but the feature held nothing.
    NothingToRemove { key: FeatureKey },
}

impl MutationOutcome {
    /// Classify writing `new` over `old`.
    ///
    /// No prior value is an initialization; a prior value with the same
    /// variant tag is an actualization; anything else is a transition.
    pub fn classify(old: Option<StateValue>, new: StateValue) -> Self {
        match old {
            None => Self::Initialization { new },
            Some(old) if old.variant() == new.variant() => Self::Actualization { old, new },
            Some(old) => Self::Transition { old, new },
        }
    }

    /// Feature the mutation applies to.
    pub fn key(&self) -> FeatureKey {
        match self {
            Self::Initialization { new } => new.key(),
            Self::Actualization { new, .. } | Self::Transition { new, .. } => new.key(),
            Self::Deinitialization { old } => old.key(),
            Self::NothingToRemove { key } => *key,
        }
    }

    /// Value held before the mutation, if any.
    pub fn previous(&self) -> Option<&StateValue> {
        match self {
            Self::Actualization { old, .. }
            | Self::Transition { old, .. }
            | Self::Deinitialization { old } => Some(old),
            Self::Initialization { .. } | Self::NothingToRemove { .. } => None,
        }
    }

    /// Value held after the mutation, if any.
    pub fn current(&self) -> Option<&StateValue> {
        match self {
            Self::Initialization { new }
            | Self::Actualization { new, .. }
            | Self::Transition { new, .. } => Some(new),
            Self::Deinitialization { .. } | Self::NothingToRemove { .. } => None,
        }
    }

    /// Typed view of [`previous`](Self::previous).
    pub fn previous_state<F: Feature>(&self) -> Option<&F::State> {
        self.previous().and_then(StateValue::downcast::<F>)
    }

    /// Typed view of [`current`](Self::current).
    pub fn current_state<F: Feature>(&self) -> Option<&F::State> {
        self.current().and_then(StateValue::downcast::<F>)
    }

    /// Short name of the outcome kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialization { .. } => "initialization",
            Self::Actualization { .. } => "actualization",
            Self::Transition { .. } => "transition",
            Self::Deinitialization { .. } => "deinitialization",
            Self::NothingToRemove { .. } => "nothing_to_remove",
        }
    }
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialization { new } => write!(f, "initialization({new})"),
            Self::Actualization { old, new } => write!(f, "actualization({old} -> {new})"),
            Self::Transition { old, new } => write!(f, "transition({old} -> {new})"),
            Self::Deinitialization { old } => write!(f, "deinitialization({old})"),
            Self::NothingToRemove { key } => write!(f, "nothing_to_remove({key})"),
        }
    }
}

/// The kind of mutation a caller believes it is performing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectedMutation {
    /// Accept whatever the store computes.
    #[default]
    Auto,

    Initialization,

    Actualization,

    /// Replace a value of a different variant, optionally a specific one.
    Transition { from: Option<&'static str> },

    /// Remove the value, optionally of a specific variant. A `strict`
    /// removal fails when there is nothing to remove.
    Deinitialization {
        from: Option<&'static str>,
        strict: bool,
    },
}

impl ExpectedMutation {
    /// Accept or reject `actual` against this intent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use featurestore::core::{ExpectedMutation, FeatureKey, MutationOutcome};
    /// # use featurestore::core::{Feature, State};
    /// # use serde::{Deserialize, Serialize};
    /// # #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    /// # enum Empty { Nothing }
    /// # impl State for Empty { fn variant(&self) -> &'static str { "Nothing" } }
    /// # struct Cart;
    /// # impl Feature for Cart { type State = Empty; }
    ///
    /// let absent = MutationOutcome::NothingToRemove { key: FeatureKey::of::<Cart>() };
    ///
    /// let lenient = ExpectedMutation::Deinitialization { from: None, strict: false };
    /// let strict = ExpectedMutation::Deinitialization { from: None, strict: true };
    ///
    /// assert!(lenient.validate(&absent).is_ok());
    /// assert!(strict.validate(&absent).is_err());
    /// ```
    pub fn validate(&self, actual: &MutationOutcome) -> Result<(), SemanticMismatch> {
        validate(self, actual)
    }
}

impl fmt::Display for ExpectedMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Initialization => f.write_str("initialization"),
            Self::Actualization => f.write_str("actualization"),
            Self::Transition { from: None } => f.write_str("transition"),
            Self::Transition { from: Some(from) } => write!(f, "transition(from {from})"),
            Self::Deinitialization { from, strict } => {
                f.write_str("deinitialization")?;
                if let Some(from) = from {
                    write!(f, "(from {from})")?;
                }
                if *strict {
                    f.write_str(" [strict]")?;
                }
                Ok(())
            }
        }
    }
}

/// Accept or reject `actual` against `expected`.
///
/// Only the combinations below are accepted; everything else is a
/// [`SemanticMismatch`].
///
/// | expected | actual |
/// |---|---|
/// | `Auto` | anything |
/// | `Initialization` | `Initialization` |
/// | `Actualization` | `Actualization` |
/// | `Transition { from: Some(v) }` | `Transition` whose old variant is `v` |
/// | `Transition { from: None }` | `Transition` |
/// | `Deinitialization { from: Some(v), .. }` | `Deinitialization` whose old variant is `v` |
/// | `Deinitialization { from: None, .. }` | `Deinitialization` |
/// | `Deinitialization { from: None, strict: false }` | `NothingToRemove` |
pub fn validate(expected: &ExpectedMutation, actual: &MutationOutcome) -> Result<(), SemanticMismatch> {
    use ExpectedMutation as E;
    use MutationOutcome as M;

    let accepted = match (expected, actual) {
        (E::Auto, _) => true,
        (E::Initialization, M::Initialization { .. }) => true,
        (E::Actualization, M::Actualization { .. }) => true,
        (E::Transition { from: Some(from) }, M::Transition { old, .. }) => old.variant() == *from,
        (E::Transition { from: None }, M::Transition { .. }) => true,
        (E::Deinitialization { from: Some(from), .. }, M::Deinitialization { old }) => {
            old.variant() == *from
        }
        (E::Deinitialization { from: None, .. }, M::Deinitialization { .. }) => true,
        (
            E::Deinitialization {
                from: None,
                strict: false,
            },
            M::NothingToRemove { .. },
        ) => true,
        _ => false,
    };

    if accepted {
        Ok(())
    } else {
        Err(SemanticMismatch {
            expected: expected.clone(),
            actual: actual.clone(),
        })
    }
}
