//! Throw events.
//!
//! Events are pure data: one discrete throw, its outcome, and its
//! position in the log. They carry zero transition logic.

use serde::{Deserialize, Serialize};

use crate::domain::Team;

/// Outcome of a single throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrowKind {
    Hit,
    Miss,
}

/// One throw, immutable once appended to the log.
///
/// `sequence` is the action's 0-based position in the log; replay
/// slicing and the append path both validate it. `timestamp` is an
/// opaque string stamped by the input-collection layer; the kernel
/// never reads clocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThrowAction {
    pub kind: ThrowKind,
    pub player_id: String,
    pub team: Team,
    pub sequence: u64,
    pub timestamp: String,
}

impl ThrowAction {
    pub fn is_hit(&self) -> bool {
        self.kind == ThrowKind::Hit
    }
}
