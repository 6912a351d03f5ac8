//! Round segmentation — derived possession rounds for display.
//!
//! Read-only view over the event log, recomputed on demand and never
//! cached as source of truth. A round is a run of consecutive actions
//! thrown by one team within one phase kind; a whole rebuttal is a
//! single round no matter how many throws it took.

use serde::{Deserialize, Serialize};

use pong_engine::domain::{GameState, MatchConfig, Phase, Team};
use pong_engine::engine::{EngineError, MatchEngine};
use pong_engine::events::ThrowAction;

/// Phase a round was thrown in, collapsed to its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Regular,
    Overtime,
    ReturnServe,
}

impl RoundPhase {
    fn of(phase: &Phase) -> Self {
        match phase {
            Phase::Regular => RoundPhase::Regular,
            Phase::Overtime => RoundPhase::Overtime,
            Phase::ReturnServe(_) => RoundPhase::ReturnServe,
            // An ended match accepts no actions, so no round ever
            // observes this phase.
            Phase::Ended => RoundPhase::Regular,
        }
    }
}

/// One possession round: consecutive throws by the same team within
/// one phase kind.
///
/// `opening` marks the single-action round of the mandatory opening
/// throw so turn-outcome tables can exclude it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub team: Team,
    pub phase: RoundPhase,
    pub opening: bool,
    pub throws: Vec<ThrowAction>,
}

/// Partition the log into possession rounds.
///
/// A new round starts whenever the team in possession or the phase
/// kind observed before an action differs from the running round's.
/// Concatenating the returned rounds' throws reconstructs the log
/// exactly.
pub fn segment(config: &MatchConfig, actions: &[ThrowAction]) -> Result<Vec<Round>, EngineError> {
    let mut engine = MatchEngine::new(config.clone());
    let mut rounds: Vec<Round> = Vec::new();

    for action in actions {
        let before: &GameState = engine.state();
        let phase = RoundPhase::of(&before.phase);
        let team = before.current_turn;
        let opening = !before.opening_throw_taken;

        match rounds.last_mut() {
            Some(round) if round.team == team && round.phase == phase && !round.opening => {
                round.throws.push(action.clone());
            }
            _ => rounds.push(Round {
                team,
                phase,
                opening,
                throws: vec![action.clone()],
            }),
        }

        engine.apply(action)?;
    }

    Ok(rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pong_engine::events::ThrowKind;

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
    fn empty_log_has_no_rounds() {
        assert!(segment(&config(), &[]).unwrap().is_empty());
    }

    #[test]
    fn opening_throw_is_its_own_flagged_round() {
        let actions = vec![
            throw(0, Team::Home, "mia", true),
            throw(1, Team::Away, "ida", true),
            throw(2, Team::Away, "zoe", false),
        ];
        let rounds = segment(&config(), &actions).unwrap();
        assert_eq!(rounds.len(), 2);
        assert!(rounds[0].opening);
        assert_eq!(rounds[0].team, Team::Home);
        assert_eq!(rounds[0].throws.len(), 1);
        assert!(!rounds[1].opening);
        assert_eq!(rounds[1].team, Team::Away);
        assert_eq!(rounds[1].throws.len(), 2);
    }

    #[test]
    fn turn_pass_starts_a_new_round() {
        let actions = vec![
            throw(0, Team::Home, "mia", false),
            throw(1, Team::Away, "ida", true),
            throw(2, Team::Away, "zoe", true),
            throw(3, Team::Away, "ida", false), // bonus throw, same round
            throw(4, Team::Home, "ben", false),
        ];
        let rounds = segment(&config(), &actions).unwrap();
        let teams: Vec<Team> = rounds.iter().map(|r| r.team).collect();
        assert_eq!(teams, vec![Team::Home, Team::Away, Team::Home]);
        assert_eq!(rounds[1].throws.len(), 3);
    }

    #[test]
    fn concatenated_rounds_reconstruct_the_log() {
        let actions = vec![
            throw(0, Team::Home, "mia", true),
            throw(1, Team::Away, "ida", true),
            throw(2, Team::Away, "zoe", true),
            throw(3, Team::Away, "zoe", false),
            throw(4, Team::Home, "ben", true),
            throw(5, Team::Home, "mia", false),
        ];
        let rounds = segment(&config(), &actions).unwrap();
        let rebuilt: Vec<ThrowAction> = rounds.into_iter().flat_map(|r| r.throws).collect();
        assert_eq!(rebuilt, actions);
    }
}
