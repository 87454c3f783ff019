//! Transaction origins and in-flight transaction state.

use crate::core::Store;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::panic::Location;
use uuid::Uuid;

/// Who started, committed or rejected a transaction.
///
/// Carries a human readable name plus the source location that created it,
/// so reports can point back at the calling code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Origin {
    name: String,
    file: &'static str,
    line: u32,
}

impl Origin {
    /// Create an origin tagged with the caller's source location.
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            name: name.into(),
            file: location.file(),
            line: location.line(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.name, self.file, self.line)
    }
}

/// An active transaction: the pre-transaction snapshot plus the private
/// working copy that handlers mutate.
#[derive(Debug)]
pub(crate) struct Transaction {
    pub(crate) origin: Origin,
    pub(crate) snapshot: Store,
    pub(crate) working: Store,
    pub(crate) started_at: DateTime<Utc>,
}

impl Transaction {
    pub(crate) fn begin(origin: Origin, live: &Store) -> Self {
        Self {
            origin,
            snapshot: live.clone(),
            working: live.clone(),
            started_at: Utc::now(),
        }
    }

    /// History generation the transaction was started against.
    pub(crate) fn reset_id(&self) -> Uuid {
        self.snapshot.reset_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::feature_state! {
        enum TestState {
            On,
        }
    }

    crate::feature!(Switch => TestState);

    #[test]
    fn origin_captures_caller_location() {
        let line = line!() + 1;
        let origin = Origin::new("boot");

        assert_eq!(origin.name(), "boot");
        assert_eq!(origin.file(), file!());
        assert_eq!(origin.line(), line);
        assert_eq!(origin.to_string(), format!("boot ({}:{})", file!(), line));
    }

    #[test]
    fn working_copy_is_private() {
        let live = Store::new();
        let mut transaction = Transaction::begin(Origin::new("t"), &live);

        transaction.working.initialize::<Switch>(TestState::On).unwrap();

        assert!(!live.has::<Switch>());
        assert!(!transaction.snapshot.has::<Switch>());
        assert!(transaction.working.has::<Switch>());
        assert_eq!(transaction.reset_id(), live.reset_id());
    }
}
