//! Centralized transition logic.
//!
//! ALL state mutation lives here. `apply` validates the action against
//! the current state, clones the state, mutates the clone, and returns
//! it together with a structured outcome. Illegal input comes back as a
//! typed error and the original state is never touched.

use thiserror::Error;

use crate::domain::{
    GameState, MatchConfig, Phase, RebuttalMode, RebuttalOrigin, ReturnServeState, Team,
    ThrowOutcome,
};
use crate::events::ThrowAction;

/// Base-game win threshold in cups.
pub const WIN_THRESHOLD: u32 = 10;
/// Cups per overtime period.
pub const OVERTIME_TARGET: u32 = 3;

/// Rejected throw. State is untouched whenever one of these comes back.
///
/// The input-collection layer is expected to offer only legal throws to
/// the operator, but the kernel re-validates everything itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalAction {
    #[error("match already ended, no further throws accepted")]
    MatchEnded,
    #[error("unknown player {0:?}")]
    UnknownPlayer(String),
    #[error("player {player:?} throws for {actual}, action claims {claimed}")]
    TeamMismatch {
        player: String,
        claimed: Team,
        actual: Team,
    },
    #[error("{team} is not in possession")]
    OutOfTurn { team: Team },
    #[error("player {player:?} threw last and must hand over to a teammate")]
    AlternationViolation { player: String },
}

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Apply *action* to *state* and return `(new_state, outcome)`.
pub fn apply(
    config: &MatchConfig,
    state: &GameState,
    action: &ThrowAction,
) -> Result<(GameState, ThrowOutcome), IllegalAction> {
    if state.ended {
        return Err(IllegalAction::MatchEnded);
    }
    let team = config
        .team_of(&action.player_id)
        .ok_or_else(|| IllegalAction::UnknownPlayer(action.player_id.clone()))?;
    if team != action.team {
        return Err(IllegalAction::TeamMismatch {
            player: action.player_id.clone(),
            claimed: action.team,
            actual: team,
        });
    }

    let mut next = state.clone();
    let mut outcome = ThrowOutcome::default();

    match state.phase.clone() {
        Phase::Regular if !state.opening_throw_taken => {
            apply_opening_throw(&mut next, action, &mut outcome)?
        }
        Phase::Regular => apply_turn_throw(&mut next, action, false, &mut outcome)?,
        Phase::Overtime => apply_turn_throw(&mut next, action, true, &mut outcome)?,
        Phase::ReturnServe(serve) => {
            apply_return_serve_throw(&mut next, &serve, action, &mut outcome)?
        }
        Phase::Ended => return Err(IllegalAction::MatchEnded),
    }

    Ok((next, outcome))
}

// ---------------------------------------------------------------------------
// Individual transition handlers (private)
// ---------------------------------------------------------------------------

/// The single mandatory opening throw. Either player of the team in
/// possession may take it; a hit scores one cup; possession passes
/// unconditionally. It never counts toward the 2-throw turn structure.
fn apply_opening_throw(
    next: &mut GameState,
    action: &ThrowAction,
    outcome: &mut ThrowOutcome,
) -> Result<(), IllegalAction> {
    if action.team != next.current_turn {
        return Err(IllegalAction::OutOfTurn { team: action.team });
    }
    if action.is_hit() {
        add_score(next, action.team, 1);
    }
    next.opening_throw_taken = true;
    next.last_thrower = Some(action.player_id.clone());
    pass_turn(next);
    outcome.turn_passed = true;
    Ok(())
}

/// One throw of a regular or overtime turn: throw 1 by either
/// team-mate, throw 2 by the other one, a bonus throw after two
/// turn-hits. The win-threshold check fires on every hit and pre-empts
/// the rest of the turn.
fn apply_turn_throw(
    next: &mut GameState,
    action: &ThrowAction,
    overtime: bool,
    outcome: &mut ThrowOutcome,
) -> Result<(), IllegalAction> {
    if action.team != next.current_turn {
        return Err(IllegalAction::OutOfTurn { team: action.team });
    }

    // Throw 2 must come from the team-mate who did not take throw 1.
    // The constraint is a function of the last thrower, not user choice.
    if next.throws_in_turn == 1 {
        let previous = if overtime {
            next.last_overtime_thrower.as_deref()
        } else {
            next.last_thrower.as_deref()
        };
        if previous == Some(action.player_id.as_str()) {
            return Err(IllegalAction::AlternationViolation {
                player: action.player_id.clone(),
            });
        }
    }

    let throw_index = next.throws_in_turn + 1;
    next.throws_in_turn = throw_index;
    next.last_thrower = Some(action.player_id.clone());
    if overtime {
        next.last_overtime_thrower = Some(action.player_id.clone());
    }

    if action.is_hit() {
        // The bonus throw scores but never raises hits_in_turn past 2.
        if throw_index <= 2 {
            next.hits_in_turn += 1;
        }
        let team = action.team;
        let opponent = team.opponent();
        if overtime {
            add_ot(next, team, 1);
            if next.ot_score(team) == OVERTIME_TARGET
                && next.ot_score(opponent) < OVERTIME_TARGET
            {
                enter_return_serve(
                    next,
                    team,
                    OVERTIME_TARGET - next.ot_score(opponent),
                    throw_index == 1,
                    RebuttalOrigin::Overtime,
                    outcome,
                );
                return Ok(());
            }
        } else {
            add_score(next, team, 1);
            if next.score(team) == WIN_THRESHOLD && next.score(opponent) < WIN_THRESHOLD {
                enter_return_serve(
                    next,
                    team,
                    WIN_THRESHOLD - next.score(opponent),
                    throw_index == 1,
                    RebuttalOrigin::Regular,
                    outcome,
                );
                return Ok(());
            }
        }
    }

    match throw_index {
        1 => {}
        2 if next.hits_in_turn == 2 => outcome.bonus_granted = true,
        _ => {
            pass_turn(next);
            outcome.turn_passed = true;
        }
    }
    Ok(())
}

/// One rebuttal throw by the defending team.
fn apply_return_serve_throw(
    next: &mut GameState,
    serve: &ReturnServeState,
    action: &ThrowAction,
    outcome: &mut ThrowOutcome,
) -> Result<(), IllegalAction> {
    let defender = serve.exit_team.opponent();
    if action.team != defender {
        return Err(IllegalAction::OutOfTurn { team: action.team });
    }

    let repeats_shooter = serve.last_shooter.as_deref() == Some(action.player_id.as_str());
    let violates = match serve.mode {
        // Strict alternation on every throw.
        RebuttalMode::SuddenDeath => repeats_shooter,
        // Only the second throw is forced to the other player.
        RebuttalMode::Standard | RebuttalMode::DoubleAttempt => {
            serve.step == 1 && repeats_shooter
        }
    };
    if violates {
        return Err(IllegalAction::AlternationViolation {
            player: action.player_id.clone(),
        });
    }

    let mut serve = serve.clone();
    serve.step += 1;
    serve.last_shooter = Some(action.player_id.clone());
    next.last_thrower = Some(action.player_id.clone());

    if action.is_hit() {
        serve.cups_needed -= 1;
        // Defending the base game climbs the defender's score toward the
        // tie. Overtime rebuttals only burn down cups_needed; the fold
        // uses the counters as they stood at the trigger.
        if serve.origin == RebuttalOrigin::Regular {
            add_score(next, defender, 1);
        }
        if serve.cups_needed == 0 {
            defend_successfully(next, &serve, defender, outcome);
        } else {
            next.phase = Phase::ReturnServe(serve);
        }
    } else {
        serve.attempts_left -= 1;
        if serve.attempts_left == 0 {
            next.phase = Phase::Ended;
            next.ended = true;
            outcome.match_ended = true;
        } else {
            next.phase = Phase::ReturnServe(serve);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Phase plumbing (private)
// ---------------------------------------------------------------------------

/// Move into a rebuttal for *exit_team*'s reached target.
fn enter_return_serve(
    next: &mut GameState,
    exit_team: Team,
    cups_needed: u32,
    first_throw_of_turn: bool,
    origin: RebuttalOrigin,
    outcome: &mut ThrowOutcome,
) {
    let mode = select_mode(cups_needed, first_throw_of_turn);
    next.phase = Phase::ReturnServe(ReturnServeState {
        mode,
        exit_team,
        cups_needed,
        step: 0,
        attempts_left: if mode == RebuttalMode::DoubleAttempt { 2 } else { 1 },
        last_shooter: None,
        origin,
    });
    next.current_turn = exit_team.opponent();
    next.throws_in_turn = 0;
    next.hits_in_turn = 0;
    outcome.return_serve_started = Some(mode);
}

/// The defense made its cups: start (or continue into) an overtime
/// period. A defended base game enters overtime with possession to the
/// team that reached 10. A defended overtime period folds both counters
/// into the base score and hands possession to the defense.
fn defend_successfully(
    next: &mut GameState,
    serve: &ReturnServeState,
    defender: Team,
    outcome: &mut ThrowOutcome,
) {
    match serve.origin {
        RebuttalOrigin::Regular => {
            next.current_turn = serve.exit_team;
        }
        RebuttalOrigin::Overtime => {
            next.home_score += next.ot_home;
            next.away_score += next.ot_away;
            next.current_turn = defender;
            outcome.overtime_folded = true;
        }
    }
    next.phase = Phase::Overtime;
    next.ot_home = 0;
    next.ot_away = 0;
    next.overtime_period += 1;
    next.throws_in_turn = 0;
    next.hits_in_turn = 0;
    next.last_overtime_thrower = None;
    outcome.overtime_started = true;
}

/// Rebuttal mode against the remaining cups and whether the threshold
/// fell on the turn's first throw.
fn select_mode(cups_needed: u32, first_throw_of_turn: bool) -> RebuttalMode {
    if cups_needed > 3 {
        RebuttalMode::SuddenDeath
    } else if cups_needed >= 2 || first_throw_of_turn {
        RebuttalMode::Standard
    } else {
        RebuttalMode::DoubleAttempt
    }
}

fn pass_turn(next: &mut GameState) {
    next.current_turn = next.current_turn.opponent();
    next.throws_in_turn = 0;
    next.hits_in_turn = 0;
}

fn add_score(next: &mut GameState, team: Team, cups: u32) {
    match team {
        Team::Home => next.home_score += cups,
        Team::Away => next.away_score += cups,
    }
}

fn add_ot(next: &mut GameState, team: Team, cups: u32) {
    match team {
        Team::Home => next.ot_home += cups,
        Team::Away => next.ot_away += cups,
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
