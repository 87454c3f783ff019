//! Checkpoint export and restore of store contents.
//!
//! A checkpoint is an in-memory, serializable copy of a store snapshot for
//! tooling: it can be rendered as JSON or compact binary and read back.
//! Bindings and history are not part of it.

use crate::core::{ExpectedMutation, Feature, MutationOutcome, State, Store, StoreSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// One feature's value inside a checkpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    /// Feature name
    pub feature: String,

    /// Variant tag of the stored value
    pub variant: String,

    /// The state, encoded as JSON
    pub payload: String,
}

/// Serializable checkpoint of a store's contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Entries ordered by feature name
    pub entries: Vec<CheckpointEntry>,
}

impl Checkpoint {
    /// Capture the contents of a snapshot.
    ///
    /// Entries are looked up by feature name, so a snapshot in which two
    /// features share a name is refused.
    pub fn capture(snapshot: &StoreSnapshot) -> Result<Self, CheckpointError> {
        if let Some(name) = snapshot.shared_name() {
            return Err(CheckpointError::ValidationFailed(format!(
                "feature name '{name}' is shared by several features"
            )));
        }

        let entries = snapshot
            .values()
            .map(|value| {
                let state = value
                    .to_json()
                    .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))?;
                Ok(CheckpointEntry {
                    feature: value.key().name().to_string(),
                    variant: value.variant().to_string(),
                    payload: state.to_string(),
                })
            })
            .collect::<Result<Vec<_>, CheckpointError>>()?;

        let checkpoint = Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            entries,
        };
        debug!(id = %checkpoint.id, entries = checkpoint.entries.len(), "checkpoint captured");
        Ok(checkpoint)
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            serde_json::from_str(json).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate_version()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self =
            bincode::deserialize(bytes).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate_version()?;
        Ok(checkpoint)
    }

    fn validate_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }

    pub fn entry(&self, feature: &str) -> Option<&CheckpointEntry> {
        self.entries.iter().find(|entry| entry.feature == feature)
    }

    /// Typed value of feature `F`, if the checkpoint holds one.
    ///
    /// Fails when the payload does not decode as `F::State` or decodes to a
    /// different variant than the entry records.
    pub fn state<F: Feature>(&self) -> Result<Option<F::State>, CheckpointError> {
        let Some(entry) = self.entry(F::name()) else {
            return Ok(None);
        };

        let state: F::State = serde_json::from_str(&entry.payload)
            .map_err(|e| CheckpointError::DeserializationFailed(format!("{}: {e}", entry.feature)))?;

        if state.variant() != entry.variant {
            return Err(CheckpointError::ValidationFailed(format!(
                "{} decoded as variant '{}', entry says '{}'",
                entry.feature,
                state.variant(),
                entry.variant
            )));
        }

        Ok(Some(state))
    }

    /// Make feature `F` in `store` match the checkpoint.
    ///
    /// Writes the checkpointed value whatever the store holds, or removes
    /// the feature when the checkpoint has none. Meant to run inside a
    /// transaction handler.
    pub fn restore<F: Feature>(&self, store: &mut Store) -> Result<MutationOutcome, CheckpointError> {
        let outcome = match self.state::<F>()? {
            Some(state) => store.write::<F>(state, ExpectedMutation::Auto),
            None => store.remove::<F>(None, false),
        };
        outcome.map_err(|e| CheckpointError::ValidationFailed(e.to_string()))
    }
}
