//! Mutation history tracking.
//!
//! Every successful write or removal appends one entry. The buffer is
//! drained at commit and handed back to the caller as the transaction's
//! history.

use super::mutation::MutationOutcome;
use super::state::FeatureKey;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Record of a single applied mutation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// When the mutation was applied
    pub timestamp: DateTime<Utc>,
    /// What the mutation did
    pub outcome: MutationOutcome,
}

/// Ordered history of applied mutations.
///
/// Entries keep the order in which they were applied.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MutationHistory {
    entries: Vec<HistoryEntry>,
}

impl MutationHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an outcome stamped with the current time.
    pub fn record(&mut self, outcome: MutationOutcome) {
        self.push(HistoryEntry {
            timestamp: Utc::now(),
            outcome,
        });
    }

    /// Append a pre-built entry.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Get all entries in order.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Outcomes in the order they were applied.
    pub fn outcomes(&self) -> impl Iterator<Item = &MutationOutcome> + '_ {
        self.entries.iter().map(|entry| &entry.outcome)
    }

    /// Consume the history, keeping only the outcomes.
    pub fn into_outcomes(self) -> Vec<MutationOutcome> {
        self.entries.into_iter().map(|entry| entry.outcome).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Calculate total duration from first to last entry.
    ///
    /// Returns `None` if the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.entries.first(), self.entries.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Get the variant tags `key` went through.
    ///
    /// Starts with the variant held before the first recorded mutation of
    /// `key` (when there was one), followed by the variant written by each
    /// later mutation. Removals contribute nothing.
    pub fn variant_path(&self, key: &FeatureKey) -> Vec<&'static str> {
        let mut touching = self
            .outcomes()
            .filter(|outcome| outcome.key() == *key)
            .peekable();

        let mut path = Vec::new();
        if let Some(previous) = touching.peek().and_then(|outcome| outcome.previous()) {
            path.push(previous.variant());
        }
        for outcome in touching {
            if let Some(current) = outcome.current() {
                path.push(current.variant());
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Feature, State, StateValue};
    use serde::Deserialize;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum TestState {
        Initial,
        Processing,
        Complete,
    }

    impl State for TestState {
        fn variant(&self) -> &'static str {
            match self {
                Self::Initial => "Initial",
                Self::Processing => "Processing",
                Self::Complete => "Complete",
            }
        }
    }

    struct Job;

    impl Feature for Job {
        type State = TestState;
    }

    struct Other;

    impl Feature for Other {
        type State = TestState;
    }

    fn value<F: Feature<State = TestState>>(state: TestState) -> StateValue {
        StateValue::new::<F>(state)
    }

    #[test]
    fn new_history_is_empty() {
        let history = MutationHistory::new();
        assert!(history.is_empty());
        assert!(history.duration().is_none());
        assert!(history.variant_path(&FeatureKey::of::<Job>()).is_empty());
    }

    #[test]
    fn record_keeps_order() {
        let mut history = MutationHistory::new();
        history.record(MutationOutcome::Initialization {
            new: value::<Job>(TestState::Initial),
        });
        history.record(MutationOutcome::Initialization {
            new: value::<Other>(TestState::Initial),
        });

        let keys: Vec<_> = history.outcomes().map(MutationOutcome::key).collect();
        assert_eq!(keys, vec![FeatureKey::of::<Job>(), FeatureKey::of::<Other>()]);
    }

    #[test]
    fn variant_path_follows_one_feature() {
        let mut history = MutationHistory::new();
        history.record(MutationOutcome::Transition {
            old: value::<Job>(TestState::Initial),
            new: value::<Job>(TestState::Processing),
        });
        history.record(MutationOutcome::Initialization {
            new: value::<Other>(TestState::Complete),
        });
        history.record(MutationOutcome::Transition {
            old: value::<Job>(TestState::Processing),
            new: value::<Job>(TestState::Complete),
        });
        history.record(MutationOutcome::Deinitialization {
            old: value::<Job>(TestState::Complete),
        });

        assert_eq!(
            history.variant_path(&FeatureKey::of::<Job>()),
            vec!["Initial", "Processing", "Complete"]
        );
        assert_eq!(history.variant_path(&FeatureKey::of::<Other>()), vec!["Complete"]);
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let start = Utc::now();
        let mut history = MutationHistory::new();
        history.push(HistoryEntry {
            timestamp: start,
            outcome: MutationOutcome::Initialization {
                new: value::<Job>(TestState::Initial),
            },
        });
        history.push(HistoryEntry {
            timestamp: start + chrono::Duration::milliseconds(10),
            outcome: MutationOutcome::Deinitialization {
                old: value::<Job>(TestState::Initial),
            },
        });

        assert_eq!(history.duration(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn single_entry_has_duration_zero() {
        let mut history = MutationHistory::new();
        history.record(MutationOutcome::Initialization {
            new: value::<Job>(TestState::Initial),
        });

        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn into_outcomes_drops_timestamps() {
        let mut history = MutationHistory::new();
        let outcome = MutationOutcome::Initialization {
            new: value::<Job>(TestState::Initial),
        };
        history.record(outcome.clone());

        assert_eq!(history.into_outcomes(), vec![outcome]);
    }

    #[test]
    fn history_serializes() {
        let mut history = MutationHistory::new();
        history.record(MutationOutcome::Initialization {
            new: value::<Job>(TestState::Processing),
        });

        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["entries"][0]["outcome"]["kind"], "initialization");
        assert_eq!(json["entries"][0]["outcome"]["new"]["variant"], "Processing");
    }
}
