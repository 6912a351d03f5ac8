//! Replay orchestrator — rebuild state from the event log.
//!
//! Delegates all rule logic to the kernel. No shortcuts, no cached
//! state: every rebuild folds the full prefix from the zero state,
//! which is what makes undo exact.

use pong_engine::domain::{GameState, MatchConfig};
use pong_engine::engine::{EngineError, MatchEngine};
use pong_engine::events::ThrowAction;
use pong_engine::hashing::canonical_hash;

/// Rebuild the match state from a sequence of actions.
///
/// 1. Create a fresh engine over the configuration
/// 2. Fold each action through the kernel in order
/// 3. Return (final_state, canonical_hash)
///
/// Pure function on the action stream, deterministic by the kernel's
/// guarantee.
pub fn rebuild_state(
    config: &MatchConfig,
    actions: &[ThrowAction],
) -> Result<(GameState, String), EngineError> {
    let mut engine = MatchEngine::new(config.clone());
    engine.apply_sequence(actions)?;
    let state = engine.state().clone();
    let hash = canonical_hash(&state);
    Ok((state, hash))
}

/// Rebuild state and return only the canonical hash.
pub fn rebuild_hash(config: &MatchConfig, actions: &[ThrowAction]) -> Result<String, EngineError> {
    let (_, hash) = rebuild_state(config, actions)?;
    Ok(hash)
}

/// State as of log position `k`: the fold of `actions[..k]`.
pub fn state_at(
    config: &MatchConfig,
    actions: &[ThrowAction],
    k: usize,
) -> Result<GameState, EngineError> {
    let prefix = &actions[..k.min(actions.len())];
    let (state, _) = rebuild_state(config, prefix)?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pong_engine::domain::Team;
    use pong_engine::events::ThrowKind;
    use pong_engine::state::create_initial_state;

    fn config() -> MatchConfig {
        MatchConfig::new("mia", "ben", "ida", "zoe").unwrap()
    }

    fn throw(sequence: u64, team: Team, player: &str, hit: bool) -> ThrowAction {
        ThrowAction {
            kind: if hit { ThrowKind::Hit } else { ThrowKind::Miss },
            player_id: player.to_string(),
            team,
            sequence,
            timestamp: String::new(),
        }
    }

    #[test]
    fn empty_log_rebuilds_the_zero_state() {
        let (state, _) = rebuild_state(&config(), &[]).unwrap();
        assert_eq!(state, create_initial_state());
    }

    #[test]
    fn prefix_replay_matches_incremental_application() {
        let config = config();
        let actions = vec![
            throw(0, Team::Home, "mia", true),
            throw(1, Team::Away, "ida", true),
            throw(2, Team::Away, "zoe", false),
            throw(3, Team::Home, "ben", true),
        ];
        let mut engine = MatchEngine::new(config.clone());
        for (k, action) in actions.iter().enumerate() {
            assert_eq!(state_at(&config, &actions, k).unwrap(), *engine.state());
            engine.apply(action).unwrap();
        }
        assert_eq!(
            state_at(&config, &actions, actions.len()).unwrap(),
            *engine.state()
        );
    }

    #[test]
    fn replay_surfaces_kernel_rejections() {
        let bad = vec![throw(0, Team::Away, "ida", true)];
        assert!(rebuild_state(&config(), &bad).is_err());
    }
}
