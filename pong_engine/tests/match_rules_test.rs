//! End-to-end rule scenarios driven through the stateful engine.
//!
//! Each test scripts a full event stream from the opening throw and
//! asserts the resulting state, the way a tracking session would see it.

use pong_engine::domain::{MatchConfig, Phase, RebuttalMode, RebuttalOrigin, Team, ThrowOutcome};
use pong_engine::engine::{EngineError, MatchEngine};
use pong_engine::events::{ThrowAction, ThrowKind};
use pong_engine::hashing::canonical_hash;
use pong_engine::transitions::IllegalAction;

/// Scripted driver: auto-numbers sequences and keeps the action log
/// around for replay checks.
struct Driver {
    engine: MatchEngine,
    log: Vec<ThrowAction>,
}

impl Driver {
    fn new() -> Self {
        let config = MatchConfig::new("mia", "ben", "ida", "zoe").unwrap();
        Self {
            engine: MatchEngine::new(config),
            log: Vec::new(),
        }
    }

    fn action(&self, team: Team, player: &str, hit: bool) -> ThrowAction {
        ThrowAction {
            kind: if hit { ThrowKind::Hit } else { ThrowKind::Miss },
            player_id: player.to_string(),
            team,
            sequence: self.log.len() as u64,
            timestamp: String::new(),
        }
    }

    fn throw(&mut self, team: Team, player: &str, hit: bool) -> ThrowOutcome {
        let action = self.action(team, player, hit);
        let (_, outcome) = self
            .engine
            .apply(&action)
            .unwrap_or_else(|e| panic!("throw {} by {} rejected: {}", action.sequence, player, e));
        self.log.push(action);
        outcome
    }

    fn try_throw(&mut self, team: Team, player: &str, hit: bool) -> Result<ThrowOutcome, EngineError> {
        let action = self.action(team, player, hit);
        match self.engine.apply(&action) {
            Ok((_, outcome)) => {
                self.log.push(action);
                Ok(outcome)
            }
            Err(e) => Err(e),
        }
    }

    fn state(&self) -> &pong_engine::domain::GameState {
        self.engine.state()
    }

    /// Play a full 3-hit turn (hit, hit, bonus hit).
    fn full_turn(&mut self, team: Team, first: &str, second: &str) {
        self.throw(team, first, true);
        let outcome = self.throw(team, second, true);
        assert!(outcome.bonus_granted);
        self.throw(team, first, true);
    }
}

/// Drive home to 10 with away at 7, trigger on a turn's first throw.
fn reach_standard_rebuttal(driver: &mut Driver) {
    driver.throw(Team::Home, "mia", true); // opening, 1:0
    driver.full_turn(Team::Away, "ida", "zoe"); // 1:3
    driver.full_turn(Team::Home, "mia", "ben"); // 4:3
    driver.full_turn(Team::Away, "ida", "zoe"); // 4:6
    driver.full_turn(Team::Home, "mia", "ben"); // 7:6
    driver.throw(Team::Away, "ida", true); // 7:7
    driver.throw(Team::Away, "zoe", false);
    driver.throw(Team::Home, "mia", true); // 8:7
    let outcome = driver.throw(Team::Home, "ben", true); // 9:7
    assert!(outcome.bonus_granted);
    driver.throw(Team::Home, "mia", false);
    driver.throw(Team::Away, "ida", false);
    driver.throw(Team::Away, "zoe", false);
    let outcome = driver.throw(Team::Home, "mia", true); // 10:7, turn's first throw
    assert_eq!(outcome.return_serve_started, Some(RebuttalMode::Standard));
}

/// Drive home to 10 with away at 9, trigger on a turn's second throw.
fn reach_double_attempt(driver: &mut Driver) {
    driver.throw(Team::Home, "mia", true); // 1:0
    driver.full_turn(Team::Away, "ida", "zoe"); // 1:3
    driver.full_turn(Team::Home, "mia", "ben"); // 4:3
    driver.full_turn(Team::Away, "ida", "zoe"); // 4:6
    driver.full_turn(Team::Home, "mia", "ben"); // 7:6
    driver.full_turn(Team::Away, "ida", "zoe"); // 7:9
    driver.throw(Team::Home, "mia", true); // 8:9
    let outcome = driver.throw(Team::Home, "ben", true); // 9:9
    assert!(outcome.bonus_granted);
    driver.throw(Team::Home, "mia", false);
    driver.throw(Team::Away, "ida", false);
    driver.throw(Team::Away, "zoe", false);
    driver.throw(Team::Home, "mia", false);
    let outcome = driver.throw(Team::Home, "ben", true); // 10:9 on throw 2
    assert_eq!(outcome.return_serve_started, Some(RebuttalMode::DoubleAttempt));
}

/// Drive a finished standard rebuttal into overtime at 10:10,
/// possession with home.
fn reach_overtime(driver: &mut Driver) {
    reach_standard_rebuttal(driver);
    driver.throw(Team::Away, "zoe", true); // 10:8
    driver.throw(Team::Away, "ida", true); // 10:9
    let outcome = driver.throw(Team::Away, "ida", true); // 10:10
    assert!(outcome.overtime_started);
}

// ─────────────────────────────────────────────────────────────
// Scenario A: opening throw
// ─────────────────────────────────────────────────────────────

#[test]
fn opening_throw_scores_and_hands_over() {
    let mut driver = Driver::new();
    let outcome = driver.throw(Team::Home, "mia", true);
    let state = driver.state();
    assert_eq!((state.home_score, state.away_score), (1, 0));
    assert_eq!(state.current_turn, Team::Away);
    assert!(state.opening_throw_taken);
    assert!(outcome.turn_passed);
}

// ─────────────────────────────────────────────────────────────
// Scenario B: 3-cup standard rebuttal
// ─────────────────────────────────────────────────────────────

#[test]
fn standard_rebuttal_enforces_step_one_alternation() {
    let mut driver = Driver::new();
    reach_standard_rebuttal(&mut driver);

    let state = driver.state();
    assert_eq!((state.home_score, state.away_score), (10, 7));
    match &state.phase {
        Phase::ReturnServe(serve) => {
            assert_eq!(serve.mode, RebuttalMode::Standard);
            assert_eq!(serve.exit_team, Team::Home);
            assert_eq!(serve.cups_needed, 3);
            assert_eq!(serve.origin, RebuttalOrigin::Regular);
        }
        other => panic!("expected a rebuttal, got {:?}", other),
    }
    assert_eq!(state.current_turn, Team::Away);

    // Step 0 by either defender.
    driver.throw(Team::Away, "zoe", true);
    assert_eq!(driver.state().away_score, 8);
    // Step 1 is forced to the other player.
    let err = driver.try_throw(Team::Away, "zoe", true).unwrap_err();
    assert_eq!(
        err,
        EngineError::Illegal(IllegalAction::AlternationViolation {
            player: "zoe".to_string()
        })
    );
    driver.throw(Team::Away, "ida", true); // 10:9
    // Step 2 is free again.
    let outcome = driver.throw(Team::Away, "ida", true); // 10:10
    assert!(outcome.overtime_started);

    let state = driver.state();
    assert_eq!((state.home_score, state.away_score), (10, 10));
    assert_eq!(state.phase, Phase::Overtime);
    assert_eq!(state.overtime_period, 1);
    // First overtime possession goes to the team that reached 10.
    assert_eq!(state.current_turn, Team::Home);
}

#[test]
fn rebuttal_preempts_remaining_turn_throws() {
    let mut driver = Driver::new();
    reach_double_attempt(&mut driver);
    // The exiting team's bonus throw never happens: possession is with
    // the defense the instant the threshold is reached.
    let err = driver.try_throw(Team::Home, "mia", true).unwrap_err();
    assert_eq!(
        err,
        EngineError::Illegal(IllegalAction::OutOfTurn { team: Team::Home })
    );
}

// ─────────────────────────────────────────────────────────────
// Scenario C: 1-cup double attempt
// ─────────────────────────────────────────────────────────────

#[test]
fn double_attempt_two_misses_end_the_match() {
    let mut driver = Driver::new();
    reach_double_attempt(&mut driver);

    driver.throw(Team::Away, "ida", false);
    // Attempt 2 is forced to the other player.
    let err = driver.try_throw(Team::Away, "ida", false).unwrap_err();
    assert_eq!(
        err,
        EngineError::Illegal(IllegalAction::AlternationViolation {
            player: "ida".to_string()
        })
    );
    let outcome = driver.try_throw(Team::Away, "zoe", false).unwrap();
    assert!(outcome.match_ended);

    let state = driver.state();
    assert!(state.ended);
    assert_eq!(state.phase, Phase::Ended);
    assert_eq!((state.home_score, state.away_score), (10, 9));

    // Terminal for good.
    let err = driver.try_throw(Team::Home, "mia", true).unwrap_err();
    assert_eq!(err, EngineError::Illegal(IllegalAction::MatchEnded));
}

#[test]
fn double_attempt_second_attempt_hit_enters_overtime() {
    let mut driver = Driver::new();
    reach_double_attempt(&mut driver);

    driver.throw(Team::Away, "ida", false);
    let outcome = driver.throw(Team::Away, "zoe", true);
    assert!(outcome.overtime_started);

    let state = driver.state();
    assert_eq!((state.home_score, state.away_score), (10, 10));
    assert_eq!(state.phase, Phase::Overtime);
    assert_eq!(state.current_turn, Team::Home);
}

#[test]
fn one_cup_on_first_throw_stays_standard() {
    let mut driver = Driver::new();
    // Same 9:9 build-up, but the trigger falls on a turn's first throw.
    driver.throw(Team::Home, "mia", true); // 1:0
    driver.full_turn(Team::Away, "ida", "zoe");
    driver.full_turn(Team::Home, "mia", "ben");
    driver.full_turn(Team::Away, "ida", "zoe");
    driver.full_turn(Team::Home, "mia", "ben"); // 7:6
    driver.full_turn(Team::Away, "ida", "zoe"); // 7:9
    driver.throw(Team::Home, "mia", true);
    driver.throw(Team::Home, "ben", true); // 9:9, bonus granted
    driver.throw(Team::Home, "mia", false);
    driver.throw(Team::Away, "ida", false);
    driver.throw(Team::Away, "zoe", false);
    let outcome = driver.throw(Team::Home, "mia", true); // 10:9 on throw 1
    assert_eq!(outcome.return_serve_started, Some(RebuttalMode::Standard));
}

// ─────────────────────────────────────────────────────────────
// Sudden death
// ─────────────────────────────────────────────────────────────

/// Drive home to 10 off a bonus throw with away stuck at 3.
fn reach_sudden_death(driver: &mut Driver) {
    driver.throw(Team::Home, "mia", true); // 1:0
    driver.throw(Team::Away, "ida", true); // 1:1
    driver.throw(Team::Away, "zoe", false);
    driver.full_turn(Team::Home, "mia", "ben"); // 4:1
    driver.throw(Team::Away, "ida", true); // 4:2
    driver.throw(Team::Away, "zoe", false);
    driver.full_turn(Team::Home, "mia", "ben"); // 7:2
    driver.throw(Team::Away, "ida", true); // 7:3
    driver.throw(Team::Away, "zoe", false);
    driver.throw(Team::Home, "mia", true); // 8:3
    driver.throw(Team::Home, "ben", true); // 9:3
    let outcome = driver.throw(Team::Home, "mia", true); // 10:3 on the bonus throw
    assert_eq!(outcome.return_serve_started, Some(RebuttalMode::SuddenDeath));
}

#[test]
fn sudden_death_miss_ends_the_match() {
    let mut driver = Driver::new();
    reach_sudden_death(&mut driver);

    match &driver.state().phase {
        Phase::ReturnServe(serve) => {
            assert_eq!(serve.cups_needed, 7);
            assert_eq!(serve.attempts_left, 1);
        }
        other => panic!("expected a rebuttal, got {:?}", other),
    }

    driver.throw(Team::Away, "ida", true); // 10:4
    // Strict alternation on every sudden-death throw.
    let err = driver.try_throw(Team::Away, "ida", true).unwrap_err();
    assert_eq!(
        err,
        EngineError::Illegal(IllegalAction::AlternationViolation {
            player: "ida".to_string()
        })
    );
    driver.throw(Team::Away, "zoe", true); // 10:5
    driver.throw(Team::Away, "ida", true); // 10:6
    let outcome = driver.try_throw(Team::Away, "zoe", false).unwrap();
    assert!(outcome.match_ended);
    assert!(driver.state().ended);
    assert_eq!((driver.state().home_score, driver.state().away_score), (10, 6));
}

#[test]
fn sudden_death_full_defense_reaches_overtime() {
    let mut driver = Driver::new();
    reach_sudden_death(&mut driver);

    for player in ["ida", "zoe", "ida", "zoe", "ida", "zoe", "ida"] {
        driver.throw(Team::Away, player, true);
    }
    let state = driver.state();
    assert_eq!((state.home_score, state.away_score), (10, 10));
    assert_eq!(state.phase, Phase::Overtime);
    assert_eq!(state.overtime_period, 1);
    assert_eq!(state.current_turn, Team::Home);
}

// ─────────────────────────────────────────────────────────────
// Scenario D: overtime and the fold
// ─────────────────────────────────────────────────────────────

#[test]
fn overtime_fold_after_defended_nested_rebuttal() {
    let mut driver = Driver::new();
    reach_overtime(&mut driver);

    // Home overtime turn: one cup, then a miss ends the turn.
    driver.throw(Team::Home, "mia", true);
    driver.throw(Team::Home, "ben", false);
    assert_eq!(driver.state().ot_home, 1);

    // Away runs its counter to 3 off a bonus throw.
    driver.throw(Team::Away, "ida", true);
    let outcome = driver.throw(Team::Away, "zoe", true);
    assert!(outcome.bonus_granted);
    let outcome = driver.throw(Team::Away, "ida", true);
    assert_eq!(outcome.return_serve_started, Some(RebuttalMode::Standard));

    let state = driver.state();
    match &state.phase {
        Phase::ReturnServe(serve) => {
            assert_eq!(serve.exit_team, Team::Away);
            assert_eq!(serve.cups_needed, 2);
            assert_eq!(serve.origin, RebuttalOrigin::Overtime);
        }
        other => panic!("expected a nested rebuttal, got {:?}", other),
    }
    assert_eq!(state.current_turn, Team::Home);

    // Defense makes both cups; the counters fold as they stood.
    driver.throw(Team::Home, "ben", true);
    let err = driver.try_throw(Team::Home, "ben", true).unwrap_err();
    assert_eq!(
        err,
        EngineError::Illegal(IllegalAction::AlternationViolation {
            player: "ben".to_string()
        })
    );
    let outcome = driver.throw(Team::Home, "mia", true);
    assert!(outcome.overtime_folded);
    assert!(outcome.overtime_started);

    let state = driver.state();
    assert_eq!((state.home_score, state.away_score), (11, 13));
    assert_eq!((state.ot_home, state.ot_away), (0, 0));
    assert_eq!(state.overtime_period, 2);
    assert_eq!(state.phase, Phase::Overtime);
    // The fresh period opens with the team that just defended.
    assert_eq!(state.current_turn, Team::Home);
}

#[test]
fn overtime_alternation_matches_regular_turns() {
    let mut driver = Driver::new();
    reach_overtime(&mut driver);

    driver.throw(Team::Home, "mia", true);
    let err = driver.try_throw(Team::Home, "mia", true).unwrap_err();
    assert_eq!(
        err,
        EngineError::Illegal(IllegalAction::AlternationViolation {
            player: "mia".to_string()
        })
    );
    driver.throw(Team::Home, "ben", false);
    assert_eq!(driver.state().current_turn, Team::Away);
}

// ─────────────────────────────────────────────────────────────
// Replay determinism
// ─────────────────────────────────────────────────────────────

#[test]
fn full_script_replays_deterministically() {
    let mut driver = Driver::new();
    reach_overtime(&mut driver);
    let live_hash = canonical_hash(driver.state());

    let config = MatchConfig::new("mia", "ben", "ida", "zoe").unwrap();
    let mut engine1 = MatchEngine::new(config.clone());
    engine1.replay(&driver.log).unwrap();
    let mut engine2 = MatchEngine::new(config);
    engine2.replay(&driver.log).unwrap();

    assert_eq!(canonical_hash(engine1.state()), live_hash);
    assert_eq!(canonical_hash(engine2.state()), live_hash);
    assert_eq!(engine1.state(), driver.state());
}

#[test]
fn scores_never_decrease_outside_the_fold() {
    let mut driver = Driver::new();
    reach_standard_rebuttal(&mut driver);

    let config = MatchConfig::new("mia", "ben", "ida", "zoe").unwrap();
    let mut engine = MatchEngine::new(config);
    let mut previous = (0, 0);
    for action in &driver.log {
        let (state, _) = engine.apply(action).unwrap();
        assert!(state.home_score >= previous.0);
        assert!(state.away_score >= previous.1);
        previous = (state.home_score, state.away_score);
    }
}
