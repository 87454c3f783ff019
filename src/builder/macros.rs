//! Macros for ergonomic feature declaration.

/// Generate a state enum together with its `State` implementation.
///
/// Variants may be unit-like or carry named fields. The variant tag is the
/// variant's identifier.
///
/// # Example
///
/// ```
/// use featurestore::feature_state;
/// use featurestore::core::State;
///
/// feature_state! {
///     pub enum SessionState {
///         Anonymous,
///         SignedIn { user: String },
///     }
/// }
///
/// let state = SessionState::SignedIn { user: "ann".into() };
/// assert_eq!(state.variant(), "SignedIn");
/// ```
#[macro_export]
macro_rules! feature_state {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( {
                    $(
                        $(#[$field_meta:meta])*
                        $field:ident : $ty:ty
                    ),* $(,)?
                } )?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant $( {
                    $(
                        $(#[$field_meta])*
                        $field : $ty
                    ),*
                } )?
            ),*
        }

        impl $crate::core::State for $name {
            fn variant(&self) -> &'static str {
                match self {
                    $(Self::$variant { .. } => stringify!($variant)),*
                }
            }
        }
    };
}

/// Declare a feature key type bound to a state type.
///
/// The feature name defaults to the type's path, as in
/// `my_app::auth::Session`, so same-named types in different modules stay
/// apart in snapshots and checkpoints. A shorter `name = "..."` may be given
/// instead; it must not be shared with another feature. Bindings installed
/// while the feature is initialized may be given as an expression.
///
/// # Example
///
/// ```
/// use featurestore::{feature, feature_state};
/// use featurestore::core::Feature;
///
/// feature_state! {
///     pub enum SearchState {
///         Idle,
///         Running { query: String },
///     }
/// }
///
/// feature!(pub Search => SearchState);
/// feature!(pub Suggestions => SearchState, name = "suggestions");
///
/// assert!(Search::name().ends_with("::Search"));
/// assert_eq!(Suggestions::name(), "suggestions");
/// assert!(Search::bindings().is_empty());
/// ```
#[macro_export]
macro_rules! feature {
    (@define [$(#[$meta:meta])*] $vis:vis $name:ident, $state:ty, $id:expr $(, $bindings:expr)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::core::Feature for $name {
            type State = $state;

            fn name() -> &'static str {
                $id
            }

            $(
                fn bindings() -> ::std::vec::Vec<$crate::builder::Binding> {
                    $bindings
                }
            )?
        }
    };
    ($(#[$meta:meta])* $vis:vis $name:ident => $state:ty, name = $id:literal $(, bindings = $bindings:expr)?) => {
        $crate::feature!(@define [$(#[$meta])*] $vis $name, $state, $id $(, $bindings)?);
    };
    ($(#[$meta:meta])* $vis:vis $name:ident => $state:ty $(, bindings = $bindings:expr)?) => {
        $crate::feature!(
            @define [$(#[$meta])*] $vis $name, $state,
            concat!(module_path!(), "::", stringify!($name))
            $(, $bindings)?
        );
    };
}
