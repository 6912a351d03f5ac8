//! Snapshot contract — the serialization boundary to the external
//! persistence collaborator.
//!
//! A snapshot carries `{ engine_version, config, log, state, state_hash }`.
//! No timestamps in snapshot content beyond the ones the actions
//! already carry, so identical match histories encode byte-identically.
//!
//! Restoring never trusts the embedded state: the log is replayed and
//! the result must match both the embedded state and its hash.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pong_engine::domain::{GameState, MatchConfig};
use pong_engine::engine::EngineError;
use pong_engine::events::ThrowAction;
use pong_engine::hashing::canonical_hash;
use pong_engine::ENGINE_VERSION;

use crate::event_log::{EventLog, SequenceViolation};
use crate::replay;

/// All possible snapshot failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot serialization failed: {0}")]
    Serialization(String),
    #[error("snapshot deserialization failed: {0}")]
    Deserialization(String),
    #[error("snapshot was taken by engine version {got}, this build is {expected}")]
    VersionMismatch { expected: u32, got: u32 },
    #[error(transparent)]
    Sequence(#[from] SequenceViolation),
    #[error("embedded log does not replay: {0}")]
    Replay(#[from] EngineError),
    #[error("snapshot diverged from its own log: embedded {embedded}, replayed {replayed}")]
    Divergence { embedded: String, replayed: String },
}

/// Serializable match snapshot: configuration, full log, derived state.
///
/// Any prefix of `log` combined with `config` reproduces its state via
/// replay; `state` and `state_hash` are carried for the collaborator's
/// convenience and re-verified on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchSnapshot {
    pub engine_version: u32,
    pub config: MatchConfig,
    pub log: Vec<ThrowAction>,
    pub state: GameState,
    pub state_hash: String,
}

/// Snapshot the current session data. The hash is computed here so a
/// snapshot is internally consistent by construction.
pub fn take_snapshot(
    config: &MatchConfig,
    actions: &[ThrowAction],
    state: &GameState,
) -> MatchSnapshot {
    MatchSnapshot {
        engine_version: ENGINE_VERSION,
        config: config.clone(),
        log: actions.to_vec(),
        state: state.clone(),
        state_hash: canonical_hash(state),
    }
}

/// Encode a snapshot to a JSON string.
pub fn encode_snapshot(snapshot: &MatchSnapshot) -> Result<String, SnapshotError> {
    serde_json::to_string(snapshot).map_err(|e| SnapshotError::Serialization(e.to_string()))
}

/// Decode a JSON string into a snapshot.
///
/// Strict deserialization: unknown fields and missing required fields
/// are rejected. No invariant or replay verification — use
/// `restore_snapshot` for validated loading.
pub fn decode_snapshot(json: &str) -> Result<MatchSnapshot, SnapshotError> {
    serde_json::from_str(json).map_err(|e| SnapshotError::Deserialization(e.to_string()))
}

/// Decode and fully verify a snapshot.
///
/// The safe entry point for data from the persistence collaborator:
/// checks the engine version, validates the log's sequence numbering,
/// replays it, and requires the replayed state to match the embedded
/// state and hash exactly.
pub fn restore_snapshot(json: &str) -> Result<(MatchSnapshot, EventLog), SnapshotError> {
    let snapshot = decode_snapshot(json)?;
    verify_snapshot(&snapshot).map(|log| (snapshot, log))
}

/// Replay-verify an already-decoded snapshot, returning its validated
/// event log.
pub fn verify_snapshot(snapshot: &MatchSnapshot) -> Result<EventLog, SnapshotError> {
    if snapshot.engine_version != ENGINE_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: ENGINE_VERSION,
            got: snapshot.engine_version,
        });
    }
    let log = EventLog::from_actions(snapshot.log.clone())?;
    let (replayed, replayed_hash) = replay::rebuild_state(&snapshot.config, log.actions())?;
    if replayed != snapshot.state || replayed_hash != snapshot.state_hash {
        return Err(SnapshotError::Divergence {
            embedded: snapshot.state_hash.clone(),
            replayed: replayed_hash,
        });
    }
    Ok(log)
}
