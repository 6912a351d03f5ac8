//! Core domain types.
//!
//! Pure data. No transition logic, only small derived accessors.
//! Scores and counters are plain unsigned integers; anything that
//! feeds the canonical hash stays float-free.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Teams and players ──────────────────────────────────────────────

/// One of the two sides of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Home,
    Away,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Home => Team::Away,
            Team::Away => Team::Home,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Team::Home => "home",
            Team::Away => "away",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid lineup supplied before tracking starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("player id must not be empty")]
    EmptyPlayerId,
    #[error("player {0:?} appears more than once in the lineup")]
    DuplicatePlayer(String),
}

/// The four confirmed players of a match. Immutable once tracking starts.
///
/// The home pair is listed first; the home side holds first possession.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchConfig {
    pub home_first: String,
    pub home_second: String,
    pub away_first: String,
    pub away_second: String,
}

impl MatchConfig {
    /// Build a configuration from four distinct, non-empty player ids.
    pub fn new(
        home_first: impl Into<String>,
        home_second: impl Into<String>,
        away_first: impl Into<String>,
        away_second: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            home_first: home_first.into(),
            home_second: home_second.into(),
            away_first: away_first.into(),
            away_second: away_second.into(),
        };
        let ids = config.players_in_order();
        for (i, id) in ids.iter().enumerate() {
            if id.is_empty() {
                return Err(ConfigError::EmptyPlayerId);
            }
            if ids[..i].contains(id) {
                return Err(ConfigError::DuplicatePlayer(id.to_string()));
            }
        }
        Ok(config)
    }

    /// All four player ids, home pair first.
    pub fn players_in_order(&self) -> [&str; 4] {
        [
            &self.home_first,
            &self.home_second,
            &self.away_first,
            &self.away_second,
        ]
    }

    /// The pair throwing for *team*, in listed order.
    pub fn players(&self, team: Team) -> (&str, &str) {
        match team {
            Team::Home => (&self.home_first, &self.home_second),
            Team::Away => (&self.away_first, &self.away_second),
        }
    }

    /// Which side a player throws for, if rostered at all.
    pub fn team_of(&self, player_id: &str) -> Option<Team> {
        if player_id == self.home_first || player_id == self.home_second {
            Some(Team::Home)
        } else if player_id == self.away_first || player_id == self.away_second {
            Some(Team::Away)
        } else {
            None
        }
    }

    /// The other member of a rostered player's pair.
    pub fn teammate(&self, player_id: &str) -> Option<&str> {
        let (first, second) = self.players(self.team_of(player_id)?);
        if player_id == first {
            Some(second)
        } else {
            Some(first)
        }
    }

    pub fn is_rostered(&self, player_id: &str) -> bool {
        self.team_of(player_id).is_some()
    }
}

// ── Phases ─────────────────────────────────────────────────────────

/// How the defending team gets to throw during a rebuttal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuttalMode {
    /// More than 3 cups needed: one throw at a time, strict alternation,
    /// any miss ends the match.
    SuddenDeath,
    /// 2 or 3 cups needed (or 1 cup triggered on a turn's first throw):
    /// step 0 either player, step 1 the other player, step 2+ either.
    Standard,
    /// Exactly 1 cup needed, triggered mid-turn: two attempts total,
    /// the second by the other player.
    DoubleAttempt,
}

impl RebuttalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RebuttalMode::SuddenDeath => "sudden_death",
            RebuttalMode::Standard => "standard",
            RebuttalMode::DoubleAttempt => "double_attempt",
        }
    }
}

/// Which target a rebuttal defends against: the base game to 10 cups,
/// or a 3-cup overtime period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuttalOrigin {
    Regular,
    Overtime,
}

impl RebuttalOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            RebuttalOrigin::Regular => "regular",
            RebuttalOrigin::Overtime => "overtime",
        }
    }
}

/// Live rebuttal bookkeeping. Only exists while the phase is
/// `ReturnServe`, so stale rebuttal fields are unrepresentable.
///
/// `cups_needed` is the single source of truth for the remaining cups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReturnServeState {
    pub mode: RebuttalMode,
    /// The team that reached the target and now waits out the rebuttal.
    pub exit_team: Team,
    pub cups_needed: u32,
    /// Rebuttal throws taken so far.
    pub step: u32,
    /// Misses the defense can still absorb. 2 for `DoubleAttempt`,
    /// 1 everywhere else.
    pub attempts_left: u32,
    pub last_shooter: Option<String>,
    pub origin: RebuttalOrigin,
}

/// Match phase as a closed union; every transition site matches on it
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Regular,
    Overtime,
    ReturnServe(ReturnServeState),
    Ended,
}

// ── Game state ─────────────────────────────────────────────────────

/// Complete live match state.
///
/// Derivable purely from `(MatchConfig, log[0..n])`; nothing outside
/// `transitions::apply` may mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameState {
    /// Base-phase scores. Exclude the live overtime counters until a
    /// period is folded in.
    pub home_score: u32,
    pub away_score: u32,
    pub phase: Phase,
    pub current_turn: Team,
    /// Throws taken in the running turn. 2 means a granted bonus throw
    /// is pending; the value 3 never survives an apply (the turn passes
    /// and the counter resets in the same transition).
    pub throws_in_turn: u32,
    /// Hits among the turn's first two throws. The bonus throw scores
    /// but never raises this past 2.
    pub hits_in_turn: u32,
    pub last_thrower: Option<String>,
    pub last_overtime_thrower: Option<String>,
    pub opening_throw_taken: bool,
    /// Live overtime cup counters, folded into the base score when a
    /// period is successfully defended.
    pub ot_home: u32,
    pub ot_away: u32,
    /// Overtime periods entered so far.
    pub overtime_period: u32,
    /// Terminal flag; must agree with `phase == Ended`.
    pub ended: bool,
}

impl GameState {
    pub fn score(&self, team: Team) -> u32 {
        match team {
            Team::Home => self.home_score,
            Team::Away => self.away_score,
        }
    }

    pub fn ot_score(&self, team: Team) -> u32 {
        match team {
            Team::Home => self.ot_home,
            Team::Away => self.ot_away,
        }
    }
}

// ── Transition outcome ─────────────────────────────────────────────

/// Structured, immutable description of what an accepted throw did.
/// Display layers read this instead of diffing states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowOutcome {
    /// Possession moved to the other team.
    pub turn_passed: bool,
    /// Two turn-hits earned a third throw.
    pub bonus_granted: bool,
    /// The throw put the thrower's team on the win threshold.
    pub return_serve_started: Option<RebuttalMode>,
    /// A rebuttal was defended and an overtime period began.
    pub overtime_started: bool,
    /// Overtime counters were folded into the base score.
    pub overtime_folded: bool,
    /// The defense ran out of attempts; the match is over.
    pub match_ended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_rejects_duplicate_player() {
        let err = MatchConfig::new("mia", "ben", "mia", "zoe").unwrap_err();
        assert_eq!(err, ConfigError::DuplicatePlayer("mia".to_string()));
    }

    #[test]
    fn config_rejects_empty_player() {
        let err = MatchConfig::new("mia", "", "ida", "zoe").unwrap_err();
        assert_eq!(err, ConfigError::EmptyPlayerId);
    }

    #[test]
    fn config_lookups() {
        let config = MatchConfig::new("mia", "ben", "ida", "zoe").unwrap();
        assert_eq!(config.team_of("mia"), Some(Team::Home));
        assert_eq!(config.team_of("zoe"), Some(Team::Away));
        assert_eq!(config.team_of("nobody"), None);
        assert_eq!(config.teammate("ida"), Some("zoe"));
        assert_eq!(config.players(Team::Home), ("mia", "ben"));
        assert!(config.is_rostered("ben"));
    }

    #[test]
    fn opponent_flips() {
        assert_eq!(Team::Home.opponent(), Team::Away);
        assert_eq!(Team::Away.opponent(), Team::Home);
    }
}
