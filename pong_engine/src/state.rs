//! State construction.

use crate::domain::{GameState, Phase, Team};

/// The canonical zero state every match starts from.
///
/// First possession goes to the home side; the single mandatory
/// opening throw is still pending.
pub fn create_initial_state() -> GameState {
    GameState {
        home_score: 0,
        away_score: 0,
        phase: Phase::Regular,
        current_turn: Team::Home,
        throws_in_turn: 0,
        hits_in_turn: 0,
        last_thrower: None,
        last_overtime_thrower: None,
        opening_throw_taken: false,
        ot_home: 0,
        ot_away: 0,
        overtime_period: 0,
        ended: false,
    }
}
