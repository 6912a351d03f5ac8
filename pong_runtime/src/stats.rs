//! Statistics and MVP suggestion — derived views over the event log.
//!
//! Everything here is recomputed on demand and serializable for the
//! display layer. This is the one module where floats are allowed:
//! hit rates and MVP scores never feed the canonical hash.

use serde::{Deserialize, Serialize};

use pong_engine::domain::{MatchConfig, Team};
use pong_engine::events::ThrowAction;

use crate::rounds::{Round, RoundPhase};

/// Statistics view of a single player (for API / display).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: String,
    pub team: Team,
    pub hits: u32,
    pub throws: u32,
    /// Hits over throws, 0.0 when the player never threw.
    pub hit_rate: f64,
    /// At least 10 throws, and the first 10 in log order all hit.
    pub perfect_first_ten: bool,
}

impl PlayerStats {
    /// MVP suggestion score: hits weigh most, rate and volume break
    /// near-ties.
    pub fn mvp_score(&self) -> f64 {
        self.hits as f64 + 0.1 * (self.hit_rate * 100.0) + 0.05 * self.throws as f64
    }
}

/// Combined totals of a team's pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub team: Team,
    pub hits: u32,
    pub throws: u32,
    pub hit_rate: f64,
}

/// 2-throw and 3-throw turn outcomes for one team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnBreakdown {
    pub two_throw_turns: u32,
    pub three_throw_turns: u32,
}

fn stats_for(player_id: &str, team: Team, actions: &[ThrowAction]) -> PlayerStats {
    let mut hits = 0;
    let mut throws = 0;
    let mut first_ten_hits = 0;
    for action in actions.iter().filter(|a| a.player_id == player_id) {
        throws += 1;
        if action.is_hit() {
            hits += 1;
            if throws <= 10 {
                first_ten_hits += 1;
            }
        }
    }
    PlayerStats {
        player_id: player_id.to_string(),
        team,
        hits,
        throws,
        hit_rate: hit_rate(hits, throws),
        perfect_first_ten: throws >= 10 && first_ten_hits == 10,
    }
}

fn hit_rate(hits: u32, throws: u32) -> f64 {
    if throws == 0 {
        0.0
    } else {
        hits as f64 / throws as f64
    }
}

/// Per-player statistics for all four players, in lineup order.
pub fn player_stats(config: &MatchConfig, actions: &[ThrowAction]) -> Vec<PlayerStats> {
    let mut stats = Vec::with_capacity(4);
    for team in [Team::Home, Team::Away] {
        let (first, second) = config.players(team);
        stats.push(stats_for(first, team, actions));
        stats.push(stats_for(second, team, actions));
    }
    stats
}

/// Team totals, home first.
pub fn team_stats(config: &MatchConfig, actions: &[ThrowAction]) -> [TeamStats; 2] {
    [Team::Home, Team::Away].map(|team| {
        let (first, second) = config.players(team);
        let a = stats_for(first, team, actions);
        let b = stats_for(second, team, actions);
        let hits = a.hits + b.hits;
        let throws = a.throws + b.throws;
        TeamStats {
            team,
            hits,
            throws,
            hit_rate: hit_rate(hits, throws),
        }
    })
}

/// Suggest the MVP of a team's pair: the higher MVP score wins, a tie
/// resolves to the first-listed player.
pub fn suggest_mvp(config: &MatchConfig, actions: &[ThrowAction], team: Team) -> PlayerStats {
    let (first, second) = config.players(team);
    let a = stats_for(first, team, actions);
    let b = stats_for(second, team, actions);
    if b.mvp_score() > a.mvp_score() {
        b
    } else {
        a
    }
}

/// Count 2-throw and 3-throw turn outcomes per team, home first.
/// The opening round and rebuttal rounds are not turns and are skipped.
pub fn turn_breakdown(rounds: &[Round]) -> [TurnBreakdown; 2] {
    let mut home = TurnBreakdown::default();
    let mut away = TurnBreakdown::default();
    for round in rounds {
        if round.opening || round.phase == RoundPhase::ReturnServe {
            continue;
        }
        let entry = match round.team {
            Team::Home => &mut home,
            Team::Away => &mut away,
        };
        match round.throws.len() {
            2 => entry.two_throw_turns += 1,
            3 => entry.three_throw_turns += 1,
            _ => {}
        }
    }
    [home, away]
}
