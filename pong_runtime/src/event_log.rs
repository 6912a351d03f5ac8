//! Append-only event log — the single source of truth for a match.
//!
//! Rules:
//!   - Strict append only — no mutation, no reordering
//!   - Sequence contiguous and 0-based (validated on append)
//!   - The one sanctioned removal is `truncate_last`, the undo primitive
//!
//! The log lives in memory; durable storage belongs to the external
//! persistence collaborator behind the snapshot contract.

use thiserror::Error;

use pong_engine::events::ThrowAction;

/// Append (or bulk load) broke the contiguous 0-based sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sequence violation in event log: expected {expected}, got {got}")]
pub struct SequenceViolation {
    pub expected: u64,
    pub got: u64,
}

/// In-memory append-only log of throw actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    actions: Vec<ThrowAction>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a deserialized log wholesale. Every action must carry
    /// its own 0-based position.
    pub fn from_actions(actions: Vec<ThrowAction>) -> Result<Self, SequenceViolation> {
        for (i, action) in actions.iter().enumerate() {
            if action.sequence != i as u64 {
                return Err(SequenceViolation {
                    expected: i as u64,
                    got: action.sequence,
                });
            }
        }
        Ok(Self { actions })
    }

    /// Append a single action, validating strict sequence ordering.
    pub fn append(&mut self, action: ThrowAction) -> Result<(), SequenceViolation> {
        let expected = self.next_sequence();
        if action.sequence != expected {
            return Err(SequenceViolation {
                expected,
                got: action.sequence,
            });
        }
        self.actions.push(action);
        Ok(())
    }

    /// Remove and return the newest action. The undo primitive: the
    /// caller replays the remainder to rebuild state.
    pub fn truncate_last(&mut self) -> Option<ThrowAction> {
        self.actions.pop()
    }

    /// All actions in sequence order.
    pub fn actions(&self) -> &[ThrowAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Sequence number the next appended action must carry.
    pub fn next_sequence(&self) -> u64 {
        self.actions.len() as u64
    }
}
