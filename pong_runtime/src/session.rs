//! Tracking session — one live match, one writer.
//!
//! Owns the engine, the event log and the persistence collaborator.
//!
//! Apply-before-persist order on every mutation:
//!   1. kernel apply (validates, may reject)
//!   2. event log append — only if step 1 succeeded
//!   3. push a fresh snapshot to the collaborator
//!
//! The push is fire-and-forget from the core's perspective: a sink
//! failure surfaces unmodified to the caller, is never retried, and
//! never rolls back the locally committed action.

use thiserror::Error;

use pong_engine::domain::{GameState, MatchConfig, Team, ThrowOutcome};
use pong_engine::engine::{EngineError, MatchEngine};
use pong_engine::events::ThrowAction;

use crate::drift::{self, ReplayDivergence};
use crate::event_log::{EventLog, SequenceViolation};
use crate::rounds::{self, Round};
use crate::snapshot::{self, MatchSnapshot, SnapshotError};
use crate::stats::{self, PlayerStats, TeamStats, TurnBreakdown};

/// Failure raised by the external persistence collaborator. Opaque to
/// the core and propagated unmodified.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// The external persistence collaborator's seam.
///
/// `session_started` and `session_finished` are the lifecycle markers
/// bracketing a session; `push` receives a fresh snapshot after every
/// accepted mutation.
pub trait SnapshotSink {
    fn session_started(&mut self, config: &MatchConfig) -> Result<(), SinkError>;
    fn push(&mut self, snapshot: &MatchSnapshot) -> Result<(), SinkError>;
    fn session_finished(&mut self, snapshot: &MatchSnapshot) -> Result<(), SinkError>;
}

/// No-op collaborator for tests and offline tracking.
#[derive(Debug)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn session_started(&mut self, _config: &MatchConfig) -> Result<(), SinkError> {
        Ok(())
    }

    fn push(&mut self, _snapshot: &MatchSnapshot) -> Result<(), SinkError> {
        Ok(())
    }

    fn session_finished(&mut self, _snapshot: &MatchSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Everything a session operation can fail with.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Sequence(#[from] SequenceViolation),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Divergence(#[from] ReplayDivergence),
    #[error("session already finished")]
    Finished,
    #[error("no recorded action to undo")]
    NothingToUndo,
    #[error("persistence collaborator failed: {0}")]
    Sink(SinkError),
}

/// One isolated tracking session: a single synchronous writer over a
/// single match.
#[derive(Debug)]
pub struct Session<S: SnapshotSink> {
    engine: MatchEngine,
    log: EventLog,
    sink: S,
    finished: bool,
}

impl<S: SnapshotSink> Session<S> {
    /// Start tracking: emit the "session began" marker and create the
    /// zero state.
    pub fn start(config: MatchConfig, mut sink: S) -> Result<Self, SessionError> {
        sink.session_started(&config).map_err(SessionError::Sink)?;
        log::info!(
            "session started: {} + {} vs {} + {}",
            config.home_first,
            config.home_second,
            config.away_first,
            config.away_second
        );
        Ok(Self {
            engine: MatchEngine::new(config),
            log: EventLog::new(),
            sink,
            finished: false,
        })
    }

    /// Resume from a collaborator-supplied snapshot: verify it against
    /// its own log by replay, then continue where it left off.
    pub fn resume(snapshot: &MatchSnapshot, sink: S) -> Result<Self, SessionError> {
        let log = snapshot::verify_snapshot(snapshot)?;
        let mut engine = MatchEngine::new(snapshot.config.clone());
        engine.apply_sequence(log.actions())?;
        log::info!(
            "session resumed at {} actions, score {}:{}",
            log.len(),
            engine.state().home_score,
            engine.state().away_score
        );
        Ok(Self {
            engine,
            log,
            sink,
            finished: false,
        })
    }

    /// Record one throw: kernel apply, log append, snapshot push.
    pub fn record(&mut self, action: ThrowAction) -> Result<ThrowOutcome, SessionError> {
        self.ensure_active()?;
        let (_, outcome) = self.engine.apply(&action)?;
        log::debug!(
            "throw {} by {} ({:?}) accepted",
            action.sequence,
            action.player_id,
            action.kind
        );
        self.log.append(action)?;
        if outcome.match_ended {
            log::info!(
                "match over at {}:{}",
                self.state().home_score,
                self.state().away_score
            );
        }
        self.push_current()?;
        Ok(outcome)
    }

    /// Exact undo: drop the newest action, rebuild by full replay,
    /// push the corrected snapshot.
    pub fn undo(&mut self) -> Result<ThrowAction, SessionError> {
        self.ensure_active()?;
        let removed = self.log.truncate_last().ok_or(SessionError::NothingToUndo)?;
        self.engine.replay(self.log.actions())?;
        log::info!(
            "undid throw {} by {}, {} actions remain",
            removed.sequence,
            removed.player_id,
            self.log.len()
        );
        self.push_current()?;
        Ok(removed)
    }

    /// Declare the match over and commit the final result.
    ///
    /// Allowed whether or not play reached a terminal phase (a league
    /// can commit an abandoned match). Emits the "session ended"
    /// marker exactly once; every later mutation is rejected.
    pub fn finish(&mut self) -> Result<MatchSnapshot, SessionError> {
        self.ensure_active()?;
        let snapshot = self.snapshot();
        self.finished = true;
        log::info!(
            "session finished after {} actions, final score {}:{}",
            self.log.len(),
            snapshot.state.home_score,
            snapshot.state.away_score
        );
        self.sink
            .session_finished(&snapshot)
            .map_err(SessionError::Sink)?;
        Ok(snapshot)
    }

    // ── Pull-based read APIs ───────────────────────────────────────

    pub fn config(&self) -> &MatchConfig {
        self.engine.config()
    }

    pub fn state(&self) -> &GameState {
        self.engine.state()
    }

    pub fn actions(&self) -> &[ThrowAction] {
        self.log.actions()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Snapshot of the current session data for the collaborator.
    pub fn snapshot(&self) -> MatchSnapshot {
        snapshot::take_snapshot(self.engine.config(), self.log.actions(), self.engine.state())
    }

    /// State as of log position `k`.
    pub fn state_at(&self, k: usize) -> Result<GameState, SessionError> {
        crate::replay::state_at(self.engine.config(), self.log.actions(), k).map_err(Into::into)
    }

    /// Possession rounds of the log so far.
    pub fn rounds(&self) -> Result<Vec<Round>, SessionError> {
        rounds::segment(self.engine.config(), self.log.actions()).map_err(Into::into)
    }

    /// Per-player aggregates, in lineup order.
    pub fn player_stats(&self) -> Vec<PlayerStats> {
        stats::player_stats(self.engine.config(), self.log.actions())
    }

    /// Team totals, home first.
    pub fn team_stats(&self) -> [TeamStats; 2] {
        stats::team_stats(self.engine.config(), self.log.actions())
    }

    /// Suggested MVP of a team's pair.
    pub fn suggest_mvp(&self, team: Team) -> PlayerStats {
        stats::suggest_mvp(self.engine.config(), self.log.actions(), team)
    }

    /// 2-throw and 3-throw turn counts per team, home first.
    pub fn turn_breakdown(&self) -> Result<[TurnBreakdown; 2], SessionError> {
        Ok(stats::turn_breakdown(&self.rounds()?))
    }

    /// Self-check: the live state must equal a fresh replay of the
    /// committed log.
    pub fn verify_replay_equivalence(&self) -> Result<(), ReplayDivergence> {
        drift::verify_replay_equivalence(
            self.engine.config(),
            self.log.actions(),
            self.engine.state(),
        )
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.finished {
            Err(SessionError::Finished)
        } else {
            Ok(())
        }
    }

    fn push_current(&mut self) -> Result<(), SessionError> {
        let snapshot = self.snapshot();
        self.sink.push(&snapshot).map_err(SessionError::Sink)
    }
}
