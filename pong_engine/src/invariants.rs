//! Invariant checks.
//!
//! Structural consistency checks run after every accepted transition.
//! A failure means the kernel itself is broken, not that the caller
//! sent bad input, so these surface as an internal error and never as
//! an `IllegalAction`.

use thiserror::Error;

use crate::domain::{GameState, MatchConfig, Phase, RebuttalMode, RebuttalOrigin};
use crate::transitions::{OVERTIME_TARGET, WIN_THRESHOLD};

/// Internal consistency failure. Indicates a logic bug in the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violation: {0}")]
pub struct InvariantViolation(pub String);

/// Run every invariant check. Returns the first failure, if any.
pub fn validate(config: &MatchConfig, state: &GameState) -> Result<(), InvariantViolation> {
    check_score_bounds(state)?;
    check_turn_counters(state)?;
    check_overtime_counters(state)?;
    check_ended_agreement(state)?;
    check_rebuttal_consistency(config, state)?;
    check_known_throwers(config, state)?;
    check_opening_pending(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

/// Base scores stay at or below the threshold until overtime folding,
/// and a running overtime implies both sides already reached it.
fn check_score_bounds(state: &GameState) -> Result<(), InvariantViolation> {
    match &state.phase {
        Phase::Regular => {
            if state.home_score > WIN_THRESHOLD || state.away_score > WIN_THRESHOLD {
                return Err(InvariantViolation(format!(
                    "[INVARIANT:score_bounds] regular-phase score {}:{} exceeds {}",
                    state.home_score, state.away_score, WIN_THRESHOLD
                )));
            }
        }
        Phase::ReturnServe(serve) if serve.origin == RebuttalOrigin::Regular => {
            if state.score(serve.exit_team) != WIN_THRESHOLD {
                return Err(InvariantViolation(format!(
                    "[INVARIANT:score_bounds] exit team {} defends a base rebuttal at {} cups",
                    serve.exit_team,
                    state.score(serve.exit_team)
                )));
            }
            let defender = serve.exit_team.opponent();
            if state.score(defender) + serve.cups_needed != WIN_THRESHOLD {
                return Err(InvariantViolation(format!(
                    "[INVARIANT:score_bounds] defender {} at {} cups with {} needed does not \
                     line up with the threshold",
                    defender,
                    state.score(defender),
                    serve.cups_needed
                )));
            }
        }
        Phase::Overtime => {
            if state.home_score < WIN_THRESHOLD || state.away_score < WIN_THRESHOLD {
                return Err(InvariantViolation(format!(
                    "[INVARIANT:score_bounds] overtime with a side below {}: {}:{}",
                    WIN_THRESHOLD, state.home_score, state.away_score
                )));
            }
        }
        _ => {}
    }
    Ok(())
}

/// At rest a turn holds 0, 1 or 2 recorded throws (3 resets in the
/// same transition that records it) and never more hits than throws.
fn check_turn_counters(state: &GameState) -> Result<(), InvariantViolation> {
    if state.throws_in_turn > 2 {
        return Err(InvariantViolation(format!(
            "[INVARIANT:turn_counters] throws_in_turn = {} persisted past a turn boundary",
            state.throws_in_turn
        )));
    }
    if state.hits_in_turn > state.throws_in_turn {
        return Err(InvariantViolation(format!(
            "[INVARIANT:turn_counters] hits_in_turn = {} exceeds throws_in_turn = {}",
            state.hits_in_turn, state.throws_in_turn
        )));
    }
    Ok(())
}

fn check_overtime_counters(state: &GameState) -> Result<(), InvariantViolation> {
    if state.ot_home > OVERTIME_TARGET || state.ot_away > OVERTIME_TARGET {
        return Err(InvariantViolation(format!(
            "[INVARIANT:overtime_counters] live counters {}:{} exceed the {}-cup target",
            state.ot_home, state.ot_away, OVERTIME_TARGET
        )));
    }
    if matches!(state.phase, Phase::Regular) && (state.ot_home != 0 || state.ot_away != 0) {
        return Err(InvariantViolation(
            "[INVARIANT:overtime_counters] live counters outside overtime play".to_string(),
        ));
    }
    if matches!(state.phase, Phase::Regular) && state.overtime_period != 0 {
        return Err(InvariantViolation(
            "[INVARIANT:overtime_counters] regular phase after an overtime period".to_string(),
        ));
    }
    Ok(())
}

fn check_ended_agreement(state: &GameState) -> Result<(), InvariantViolation> {
    let phase_ended = matches!(state.phase, Phase::Ended);
    if state.ended != phase_ended {
        return Err(InvariantViolation(format!(
            "[INVARIANT:ended_agreement] ended = {} but phase ended = {}",
            state.ended, phase_ended
        )));
    }
    Ok(())
}

fn check_rebuttal_consistency(
    config: &MatchConfig,
    state: &GameState,
) -> Result<(), InvariantViolation> {
    let serve = match &state.phase {
        Phase::ReturnServe(serve) => serve,
        _ => return Ok(()),
    };
    if serve.cups_needed == 0 {
        return Err(InvariantViolation(
            "[INVARIANT:rebuttal] rebuttal persisted with zero cups needed".to_string(),
        ));
    }
    match serve.mode {
        RebuttalMode::DoubleAttempt => {
            if serve.cups_needed != 1 || serve.attempts_left == 0 || serve.attempts_left > 2 {
                return Err(InvariantViolation(format!(
                    "[INVARIANT:rebuttal] double-attempt with cups_needed = {}, attempts_left = {}",
                    serve.cups_needed, serve.attempts_left
                )));
            }
        }
        _ => {
            if serve.attempts_left != 1 {
                return Err(InvariantViolation(format!(
                    "[INVARIANT:rebuttal] {} rebuttal with attempts_left = {}",
                    serve.mode.as_str(),
                    serve.attempts_left
                )));
            }
        }
    }
    match serve.origin {
        RebuttalOrigin::Regular => {
            if state.overtime_period != 0 || serve.cups_needed > WIN_THRESHOLD {
                return Err(InvariantViolation(
                    "[INVARIANT:rebuttal] base rebuttal inconsistent with overtime state"
                        .to_string(),
                ));
            }
        }
        RebuttalOrigin::Overtime => {
            if state.overtime_period == 0 || serve.cups_needed > OVERTIME_TARGET {
                return Err(InvariantViolation(
                    "[INVARIANT:rebuttal] overtime rebuttal outside an overtime period"
                        .to_string(),
                ));
            }
        }
    }
    if state.current_turn != serve.exit_team.opponent() {
        return Err(InvariantViolation(
            "[INVARIANT:rebuttal] possession is not with the defending team".to_string(),
        ));
    }
    if let Some(shooter) = &serve.last_shooter {
        if config.team_of(shooter) != Some(serve.exit_team.opponent()) {
            return Err(InvariantViolation(format!(
                "[INVARIANT:rebuttal] last shooter {:?} is not on the defending team",
                shooter
            )));
        }
    }
    Ok(())
}

/// Every remembered thrower must be one of the four rostered players.
fn check_known_throwers(
    config: &MatchConfig,
    state: &GameState,
) -> Result<(), InvariantViolation> {
    for (field, value) in [
        ("last_thrower", &state.last_thrower),
        ("last_overtime_thrower", &state.last_overtime_thrower),
    ] {
        if let Some(player) = value {
            if !config.is_rostered(player) {
                return Err(InvariantViolation(format!(
                    "[INVARIANT:known_throwers] {} = {:?} is not rostered",
                    field, player
                )));
            }
        }
    }
    Ok(())
}

/// Before the opening throw nothing may have happened yet.
fn check_opening_pending(state: &GameState) -> Result<(), InvariantViolation> {
    if state.opening_throw_taken {
        return Ok(());
    }
    if !matches!(state.phase, Phase::Regular)
        || state.home_score != 0
        || state.away_score != 0
        || state.throws_in_turn != 0
        || state.overtime_period != 0
    {
        return Err(InvariantViolation(
            "[INVARIANT:opening_pending] progress recorded before the opening throw".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MatchConfig;
    use crate::state::create_initial_state;

    fn config() -> MatchConfig {
        MatchConfig::new("mia", "ben", "ida", "zoe").unwrap()
    }

    #[test]
    fn initial_state_is_valid() {
        validate(&config(), &create_initial_state()).unwrap();
    }

    #[test]
    fn disagreeing_ended_flag_is_caught() {
        let mut state = create_initial_state();
        state.ended = true;
        let err = validate(&config(), &state).unwrap_err();
        assert!(err.0.contains("ended_agreement"));
    }

    #[test]
    fn foreign_thrower_is_caught() {
        let mut state = create_initial_state();
        state.last_thrower = Some("ghost".to_string());
        let err = validate(&config(), &state).unwrap_err();
        assert!(err.0.contains("known_throwers"));
    }
}
