//! Core store types and logic.
//!
//! This module contains the synchronous heart of the crate:
//! - Feature keys and state values via the `Feature` and `State` traits
//! - Outcome classification and intent validation
//! - The `Store` mapping with its mutation history
//! - Guard predicates over mutations
//!
//! Nothing here knows about transactions or subscribers; that lives in
//! [`crate::dispatcher`].

mod error;
mod guard;
mod history;
mod mutation;
mod state;
mod store;

pub use error::{ReadDataError, SemanticMismatch, StoreError};
pub use guard::Guard;
pub use history::{HistoryEntry, MutationHistory};
pub use mutation::{validate, ExpectedMutation, MutationOutcome};
pub use state::{Feature, FeatureKey, State, StateValue};
pub use store::{Store, StoreSnapshot};
