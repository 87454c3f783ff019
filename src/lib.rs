//! Featurestore: a typed, transactional feature-state store
//!
//! Featurestore keeps a "pure core, imperative shell" split. The core is a
//! synchronous mapping from feature types to their current state, where
//! every write is classified and validated against what the caller meant to
//! do. The shell is a single-writer dispatcher that groups writes into
//! transactions and reports each commit to bindings and observers.
//!
//! # Core Concepts
//!
//! - **Feature**: a type naming one slot of the store, bound to a state enum
//! - **State**: the enum a feature holds; its variant tag drives classification
//! - **Mutation outcome**: what a write actually did (initialization,
//!   actualization, transition, deinitialization, or nothing to remove)
//! - **Dispatcher**: transactions with snapshot, commit and full rollback
//! - **Bindings**: `when / given / then` reactions to committed mutations
//!
//! # Example
//!
//! ```rust
//! use featurestore::builder::on_transition;
//! use featurestore::core::{Store, StoreError};
//! use featurestore::dispatcher::{Dispatcher, Origin};
//! use featurestore::{feature, feature_state};
//!
//! feature_state! {
//!     pub enum AuthState {
//!         SignedOut,
//!         SignedIn { user: String },
//!     }
//! }
//!
//! feature!(pub Auth => AuthState, bindings = vec![
//!     on_transition::<Auth, _>("greet", "SignedIn", |state| {
//!         if let AuthState::SignedIn { user } = state {
//!             println!("welcome, {user}");
//!         }
//!     }),
//! ]);
//!
//! let mut dispatcher = Dispatcher::new();
//!
//! dispatcher
//!     .transact(Origin::new("launch"), |store: &mut Store| -> Result<(), StoreError> {
//!         store.initialize::<Auth>(AuthState::SignedOut)?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! dispatcher
//!     .transact(Origin::new("login"), |store: &mut Store| -> Result<(), StoreError> {
//!         store.transition::<Auth>(AuthState::SignedIn { user: "ann".into() }, Some("SignedOut"))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert!(matches!(dispatcher.store().get::<Auth>(), Some(AuthState::SignedIn { .. })));
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod dispatcher;
pub mod enforcement;

// Re-export commonly used types
pub use crate::builder::{Binding, BindingBuilder};
pub use crate::core::{
    ExpectedMutation, Feature, FeatureKey, Guard, MutationOutcome, State, Store, StoreError, StoreSnapshot,
};
pub use crate::dispatcher::{Dispatcher, DispatcherError, Observer, Origin, Report};
