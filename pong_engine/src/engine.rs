//! Match engine.
//!
//! Thin stateful orchestrator over the pure transition layer. Enforces
//! strict action ordering, delegates mutation to transitions, validates
//! invariants on the result, then commits.

use thiserror::Error;

use crate::domain::{GameState, MatchConfig, ThrowOutcome};
use crate::events::ThrowAction;
use crate::invariants::{validate, InvariantViolation};
use crate::state::create_initial_state;
use crate::transitions::{apply as transition_apply, IllegalAction};

/// Everything the engine can reject or detect while applying actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Illegal(#[from] IllegalAction),
    #[error("out-of-order action: expected sequence {expected}, got {got}")]
    OutOfSequence { expected: u64, got: u64 },
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Stateful engine wrapping the pure transition function.
#[derive(Debug)]
pub struct MatchEngine {
    config: MatchConfig,
    state: GameState,
    next_sequence: u64,
}

impl MatchEngine {
    /// Create a fresh engine over a validated configuration.
    pub fn new(config: MatchConfig) -> Self {
        Self {
            config,
            state: create_initial_state(),
            next_sequence: 0,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Sequence number the next action must carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Apply a single action:
    ///   1. Validate strict 0-based sequence ordering
    ///   2. Delegate to the pure transition function
    ///   3. Validate invariants on the new state
    ///   4. Commit and return
    pub fn apply(
        &mut self,
        action: &ThrowAction,
    ) -> Result<(&GameState, ThrowOutcome), EngineError> {
        if action.sequence != self.next_sequence {
            return Err(EngineError::OutOfSequence {
                expected: self.next_sequence,
                got: action.sequence,
            });
        }
        let (next, outcome) = transition_apply(&self.config, &self.state, action)?;
        validate(&self.config, &next)?;
        self.state = next;
        self.next_sequence += 1;
        Ok((&self.state, outcome))
    }

    /// Apply an ordered sequence of actions.
    pub fn apply_sequence(&mut self, actions: &[ThrowAction]) -> Result<&GameState, EngineError> {
        for action in actions {
            self.apply(action)?;
        }
        Ok(&self.state)
    }

    /// Reset to the canonical zero state.
    pub fn reset(&mut self) {
        self.state = create_initial_state();
        self.next_sequence = 0;
    }

    /// Event-sourced reconstruction: reset and fold the full log.
    pub fn replay(&mut self, actions: &[ThrowAction]) -> Result<&GameState, EngineError> {
        self.reset();
        for action in actions {
            self.apply(action)?;
        }
        Ok(&self.state)
    }
}
