//! Replay-equivalence verification.
//!
//! The foundational undo property: the live, incrementally-built state
//! must equal a from-scratch replay of the committed log. A mismatch
//! means a kernel logic bug, and the report names the diverged fields
//! so the bug is diagnosable from the error alone.

use thiserror::Error;

use pong_engine::domain::{GameState, MatchConfig};
use pong_engine::engine::EngineError;
use pong_engine::events::ThrowAction;
use pong_engine::hashing::canonical_hash;

use crate::replay;

/// Incremental and replayed state disagree, or the committed log no
/// longer replays at all. Should never occur in a correct build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayDivergence {
    #[error("committed log failed to replay: {0}")]
    ReplayFailed(#[from] EngineError),
    #[error(
        "live state diverged from replay: live {live_hash}, replayed {replayed_hash}, \
         fields {diff_fields:?}"
    )]
    StateMismatch {
        live_hash: String,
        replayed_hash: String,
        diff_fields: Vec<String>,
    },
}

/// Replay the log and require the result to equal the live state.
pub fn verify_replay_equivalence(
    config: &MatchConfig,
    actions: &[ThrowAction],
    live: &GameState,
) -> Result<(), ReplayDivergence> {
    let (replayed, replayed_hash) = replay::rebuild_state(config, actions)?;
    if replayed == *live {
        return Ok(());
    }
    Err(ReplayDivergence::StateMismatch {
        live_hash: canonical_hash(live),
        replayed_hash,
        diff_fields: diff_fields(live, &replayed),
    })
}

/// Field-level comparison of two states, for divergence reports.
pub fn diff_fields(a: &GameState, b: &GameState) -> Vec<String> {
    let mut fields = Vec::new();
    let mut check = |name: &str, differs: bool| {
        if differs {
            fields.push(name.to_string());
        }
    };
    check("home_score", a.home_score != b.home_score);
    check("away_score", a.away_score != b.away_score);
    check("phase", a.phase != b.phase);
    check("current_turn", a.current_turn != b.current_turn);
    check("throws_in_turn", a.throws_in_turn != b.throws_in_turn);
    check("hits_in_turn", a.hits_in_turn != b.hits_in_turn);
    check("last_thrower", a.last_thrower != b.last_thrower);
    check(
        "last_overtime_thrower",
        a.last_overtime_thrower != b.last_overtime_thrower,
    );
    check(
        "opening_throw_taken",
        a.opening_throw_taken != b.opening_throw_taken,
    );
    check("ot_home", a.ot_home != b.ot_home);
    check("ot_away", a.ot_away != b.ot_away);
    check("overtime_period", a.overtime_period != b.overtime_period);
    check("ended", a.ended != b.ended);
    fields
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
    fn equivalent_states_verify() {
        let config = config();
        let actions = vec![throw(0, Team::Home, "mia", true)];
        let (live, _) = replay::rebuild_state(&config, &actions).unwrap();
        verify_replay_equivalence(&config, &actions, &live).unwrap();
    }

    #[test]
    fn corrupted_live_state_is_reported_with_fields() {
        let config = config();
        let actions = vec![throw(0, Team::Home, "mia", true)];
        let (mut live, _) = replay::rebuild_state(&config, &actions).unwrap();
        live.home_score = 9;
        live.ot_away = 2;
        match verify_replay_equivalence(&config, &actions, &live).unwrap_err() {
            ReplayDivergence::StateMismatch { diff_fields, .. } => {
                assert_eq!(diff_fields, vec!["home_score", "ot_away"]);
            }
            other => panic!("expected a state mismatch, got {:?}", other),
        }
    }

    #[test]
    fn identical_states_have_no_diff() {
        let a = create_initial_state();
        assert!(diff_fields(&a, &a.clone()).is_empty());
    }
}
