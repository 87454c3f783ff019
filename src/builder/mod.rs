//! Builder API for declaring features and their bindings.
//!
//! This module provides a fluent binding builder, shorthand constructors
//! for the most common reactions, and macros that cut the boilerplate of
//! declaring features and state enums.

pub mod binding;
pub mod error;
pub mod macros;

pub use binding::{Binding, BindingBuilder};
pub use error::BuildError;

use crate::core::{Feature, Guard, MutationOutcome, StoreSnapshot};
use std::sync::Arc;

/// Binding that receives feature `F`'s first value.
///
/// # Example
///
/// ```
/// use featurestore::builder::on_initialize;
/// use featurestore::{feature, feature_state};
///
/// feature_state! {
///     enum PlayerState {
///         Stopped,
///         Playing { track: u32 },
///     }
/// }
///
/// feature!(Player => PlayerState);
///
/// let binding = on_initialize::<Player, _>("player ready", |state| {
///     println!("player starts as {state:?}");
/// });
/// assert_eq!(binding.description(), "player ready");
/// ```
pub fn on_initialize<F, C>(description: impl Into<String>, callback: C) -> Binding
where
    F: Feature,
    C: Fn(F::State) + Send + Sync + 'static,
{
    binding::assemble::<F::State>(
        description.into(),
        Guard::initialized::<F>(),
        Arc::new(|mutation: &MutationOutcome, _: &StoreSnapshot| {
            mutation.current_state::<F>().cloned()
        }),
        Arc::new(callback),
    )
}

/// Binding that receives feature `F`'s last value when it is removed.
pub fn on_deinitialize<F, C>(description: impl Into<String>, callback: C) -> Binding
where
    F: Feature,
    C: Fn(F::State) + Send + Sync + 'static,
{
    binding::assemble::<F::State>(
        description.into(),
        Guard::deinitialized::<F>(),
        Arc::new(|mutation: &MutationOutcome, _: &StoreSnapshot| {
            mutation.previous_state::<F>().cloned()
        }),
        Arc::new(callback),
    )
}

/// Binding that receives feature `F`'s new value whenever it transitions
/// into `variant`.
pub fn on_transition<F, C>(description: impl Into<String>, variant: &'static str, callback: C) -> Binding
where
    F: Feature,
    C: Fn(F::State) + Send + Sync + 'static,
{
    binding::assemble::<F::State>(
        description.into(),
        Guard::transitioned_to::<F>(variant),
        Arc::new(|mutation: &MutationOutcome, _: &StoreSnapshot| {
            mutation.current_state::<F>().cloned()
        }),
        Arc::new(callback),
    )
}
