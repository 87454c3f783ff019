//! Validation-based commit rules.
//!
//! Commit rules are checked against a transaction's working copy right
//! before it becomes visible. They use Stillwater's `Validation` type so
//! that every violated rule is reported at once instead of only the first.
//!
//! # Example
//!
//! ```rust
//! use featurestore::dispatcher::Dispatcher;
//! use featurestore::enforcement::{RulesBuilder, ViolationStrategy};
//! use std::time::Duration;
//!
//! let rules = RulesBuilder::new()
//!     .max_mutations(16)
//!     .timeout(Duration::from_secs(1))
//!     .on_violation(ViolationStrategy::Reject)
//!     .build();
//!
//! let dispatcher = Dispatcher::new().with_rules(rules);
//! assert!(!dispatcher.is_transaction_active());
//! ```

pub mod builder;
pub mod context;
pub mod rules;
pub mod violations;

pub use builder::RulesBuilder;
pub use context::CommitContext;
pub use rules::{CommitCheck, CommitRules};
pub use violations::{ViolationError, ViolationStrategy};
