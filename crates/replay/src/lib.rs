//! Courtside Replay Engine
//!
//! This crate provides the deterministic, stepwise consumption of an
//! extracted [`EventSequence`]: one event per external advance signal, never
//! zero, never more than one. Pacing is entirely the caller's concern; the
//! engine performs no I/O and never suspends.
//!
//! # Architecture
//!
//! - [`ReplayEngine`]: owns the sequence and the cursor after extraction
//!   completes; callers interact only through `start`/`stop`/`reset`/
//!   `advance` and the returned [`StepOutcome`]
//! - [`WinFlagPolicy`]: how an event carrying both win flags is treated
//!
//! The cursor is exclusively owned here. A reset replays the same sequence;
//! it never re-extracts.

#![deny(unsafe_code)]

use std::fmt;

use courtside_score::{DisplayState, EventSequence};
use tracing::{debug, warn};

// ============================================================================
// Engine State
// ============================================================================

/// Replay lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Cursor at 0, not started.
    Idle,
    /// Advancing on each external signal.
    Running,
    /// Cursor frozen; resumable with `start`.
    Paused,
    /// Cursor at the sequence end; terminal until `reset`.
    Exhausted,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Exhausted => "exhausted",
        }
    }
}

// ============================================================================
// Win Flag Policy
// ============================================================================

/// Treatment of an event with both win flags set.
///
/// Mutual exclusion of the flags is assumed, never enforced upstream. The
/// permissive default keeps player 1's banner; the other modes layer
/// checking on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WinFlagPolicy {
    /// Keep player 1's banner, no diagnostics.
    #[default]
    Permissive,
    /// Keep player 1's banner, log a warning.
    Warn,
    /// Refuse to consume the event; `advance` fails and nothing moves.
    Strict,
}

// ============================================================================
// Replay Control Surface
// ============================================================================

/// Control operation named in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Stop,
    Advance,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Advance => "advance",
        }
    }
}

/// Precondition violation reported to the caller; the engine's own state is
/// left unchanged by every error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The operation is not valid in the current state.
    Invalid {
        operation: Operation,
        state: EngineState,
    },
    /// Strict policy: the event at the cursor carries both win flags.
    ConflictingWinFlags { cursor: usize },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { operation, state } => {
                write!(
                    f,
                    "{} is not valid while the replay is {}",
                    operation.as_str(),
                    state.as_str()
                )
            }
            Self::ConflictingWinFlags { cursor } => {
                write!(f, "event {cursor} carries both win flags")
            }
        }
    }
}

impl std::error::Error for TransitionError {}

/// What one advance signal produced.
///
/// `terminal` travels with every outcome: it turns true on the call that
/// consumes the final event and stays true for every later call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub display: DisplayState,
    pub terminal: bool,
}

// ============================================================================
// Replay Engine
// ============================================================================

/// Deterministic replay of an event sequence into display states.
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    sequence: EventSequence,
    cursor: usize,
    state: EngineState,
    display: DisplayState,
    policy: WinFlagPolicy,
}

impl ReplayEngine {
    /// Create an engine over an extracted sequence, permissive win policy.
    pub fn new(sequence: EventSequence) -> Self {
        Self::with_policy(sequence, WinFlagPolicy::default())
    }

    /// Create an engine with an explicit win-flag policy.
    pub fn with_policy(sequence: EventSequence, policy: WinFlagPolicy) -> Self {
        Self {
            sequence,
            cursor: 0,
            state: EngineState::Idle,
            display: DisplayState::default(),
            policy,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Cursor position: 0 (not started) ..= sequence length (exhausted).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn sequence(&self) -> &EventSequence {
        &self.sequence
    }

    /// Display state as of the last consumed event (defaults before any).
    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Begin or resume advancing. Valid from `Idle` or `Paused`; the cursor
    /// is not touched. Combine with [`reset`](Self::reset) to restart.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        match self.state {
            EngineState::Idle | EngineState::Paused => {
                debug!(cursor = self.cursor, "replay started");
                self.state = EngineState::Running;
                Ok(())
            }
            state => Err(TransitionError::Invalid {
                operation: Operation::Start,
                state,
            }),
        }
    }

    /// Freeze the cursor. Valid from `Running` only; takes effect before the
    /// next advance is accepted.
    pub fn stop(&mut self) -> Result<(), TransitionError> {
        match self.state {
            EngineState::Running => {
                debug!(cursor = self.cursor, "replay stopped");
                self.state = EngineState::Paused;
                Ok(())
            }
            state => Err(TransitionError::Invalid {
                operation: Operation::Stop,
                state,
            }),
        }
    }

    /// Return to `Idle` from any state: cursor to 0, display cleared to the
    /// reset board. The sequence is kept; replaying after a reset yields the
    /// identical display sequence.
    pub fn reset(&mut self) {
        debug!("replay reset");
        self.cursor = 0;
        self.state = EngineState::Idle;
        self.display = DisplayState::default();
    }

    /// Consume the next event and derive display state.
    ///
    /// Valid while `Running` (consumes one event) or `Exhausted` (repeats
    /// the terminal signal without moving the cursor). The call that
    /// consumes the final event transitions to `Exhausted` and carries
    /// `terminal: true` alongside that event's display state.
    ///
    /// Under [`WinFlagPolicy::Strict`] an event with both win flags fails
    /// the call before anything is consumed.
    pub fn advance(&mut self) -> Result<StepOutcome, TransitionError> {
        match self.state {
            EngineState::Running => {}
            EngineState::Exhausted => {
                return Ok(StepOutcome {
                    display: self.display.clone(),
                    terminal: true,
                });
            }
            state => {
                return Err(TransitionError::Invalid {
                    operation: Operation::Advance,
                    state,
                });
            }
        }

        let Some(event) = self.sequence.get(self.cursor) else {
            // Running with nothing left to consume: an empty sequence.
            self.state = EngineState::Exhausted;
            debug!("replay exhausted with no events");
            return Ok(StepOutcome {
                display: self.display.clone(),
                terminal: true,
            });
        };

        if event.win1 && event.win2 {
            match self.policy {
                WinFlagPolicy::Permissive => {}
                WinFlagPolicy::Warn => {
                    warn!(cursor = self.cursor, "both win flags set, keeping player 1");
                }
                WinFlagPolicy::Strict => {
                    return Err(TransitionError::ConflictingWinFlags {
                        cursor: self.cursor,
                    });
                }
            }
        }

        self.display = DisplayState::from_event(event);
        self.cursor += 1;

        let terminal = self.cursor == self.sequence.len();
        if terminal {
            self.state = EngineState::Exhausted;
            debug!(events = self.cursor, "replay complete");
        }

        Ok(StepOutcome {
            display: self.display.clone(),
            terminal,
        })
    }

    /// Drive the replay to exhaustion, collecting the display state of each
    /// consumed event. Valid while `Running`.
    pub fn run_to_end(&mut self) -> Result<Vec<DisplayState>, TransitionError> {
        if self.state != EngineState::Running {
            return Err(TransitionError::Invalid {
                operation: Operation::Advance,
                state: self.state,
            });
        }

        let mut displays = Vec::with_capacity(self.sequence.len() - self.cursor);
        loop {
            let before = self.cursor;
            let outcome = self.advance()?;
            if self.cursor > before {
                displays.push(outcome.display);
            }
            if outcome.terminal {
                return Ok(displays);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_score::{
        PLAYER1_WIN_MESSAGE, RESET_STATE_LABEL, ScoreboardEvent, Serving, display_digest,
    };

    fn event(time_ns: u64, state: &str, p1: u32, p2: u32) -> ScoreboardEvent {
        ScoreboardEvent {
            time_ns,
            phase: 1,
            state: state.to_string(),
            p1_score: p1,
            p2_score: p2,
            win1: false,
            win2: false,
        }
    }

    fn rally_sequence() -> EventSequence {
        EventSequence::from_events(vec![
            event(0, "IDLE", 0, 0),
            event(500, "SERVE_P1", 1, 0),
            event(1000, "SERVE_P2", 1, 1),
        ])
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    #[test]
    fn test_start_from_idle_and_paused() {
        let mut engine = ReplayEngine::new(rally_sequence());
        assert_eq!(engine.state(), EngineState::Idle);

        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);

        engine.stop().unwrap();
        assert_eq!(engine.state(), EngineState::Paused);

        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running);
    }

    #[test]
    fn test_start_does_not_reset_cursor() {
        let mut engine = ReplayEngine::new(rally_sequence());
        engine.start().unwrap();
        engine.advance().unwrap();
        engine.stop().unwrap();

        engine.start().unwrap();
        assert_eq!(engine.cursor(), 1, "resume must not rewind");
    }

    #[test]
    fn test_stop_outside_running_is_invalid() {
        let mut engine = ReplayEngine::new(rally_sequence());
        let err = engine.stop().unwrap_err();
        assert_eq!(
            err,
            TransitionError::Invalid {
                operation: Operation::Stop,
                state: EngineState::Idle,
            }
        );
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_advance_while_idle_is_invalid_and_harmless() {
        let mut engine = ReplayEngine::new(rally_sequence());
        let err = engine.advance().unwrap_err();
        assert_eq!(
            err,
            TransitionError::Invalid {
                operation: Operation::Advance,
                state: EngineState::Idle,
            }
        );
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_start_from_exhausted_requires_reset() {
        let mut engine = ReplayEngine::new(EventSequence::default());
        engine.start().unwrap();
        engine.advance().unwrap();
        assert_eq!(engine.state(), EngineState::Exhausted);

        assert!(engine.start().is_err());
        engine.reset();
        assert!(engine.start().is_ok());
    }

    #[test]
    fn test_reset_clears_display_and_cursor() {
        let mut engine = ReplayEngine::new(rally_sequence());
        engine.start().unwrap();
        engine.advance().unwrap();
        engine.advance().unwrap();

        engine.reset();
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.display(), &DisplayState::default());
        assert_eq!(engine.display().state, RESET_STATE_LABEL);
    }

    // ========================================================================
    // Advancing
    // ========================================================================

    #[test]
    fn test_advance_consumes_one_event_per_signal() {
        let mut engine = ReplayEngine::new(rally_sequence());
        engine.start().unwrap();

        let outcome = engine.advance().unwrap();
        assert_eq!(engine.cursor(), 1);
        assert_eq!(outcome.display.serving, Serving::None);
        assert_eq!(outcome.display.p1_score, 0);
        assert!(!outcome.terminal);

        let outcome = engine.advance().unwrap();
        assert_eq!(engine.cursor(), 2);
        assert_eq!(outcome.display.serving, Serving::PlayerOne);
        assert_eq!(outcome.display.p1_score, 1);
        assert!(!outcome.terminal);
    }

    #[test]
    fn test_exhaustion_on_final_consume() {
        let sequence = rally_sequence();
        let len = sequence.len();
        let mut engine = ReplayEngine::new(sequence);
        engine.start().unwrap();

        for n in 1..len {
            let outcome = engine.advance().unwrap();
            assert!(!outcome.terminal, "advance {n} must not be terminal");
        }

        // The len-th advance consumes the last event and turns terminal.
        let last = engine.advance().unwrap();
        assert!(last.terminal);
        assert_eq!(last.display.serving, Serving::PlayerTwo);
        assert_eq!(engine.state(), EngineState::Exhausted);
        assert_eq!(engine.cursor(), len);

        // Further advances repeat the terminal signal without moving.
        let again = engine.advance().unwrap();
        assert!(again.terminal);
        assert_eq!(again.display, last.display);
        assert_eq!(engine.cursor(), len);
    }

    #[test]
    fn test_empty_sequence_exhausts_on_first_advance() {
        let mut engine = ReplayEngine::new(EventSequence::default());
        engine.start().unwrap();

        let outcome = engine.advance().unwrap();
        assert!(outcome.terminal);
        assert_eq!(outcome.display, DisplayState::default());
        assert_eq!(engine.state(), EngineState::Exhausted);
        assert_eq!(engine.cursor(), 0);
    }

    #[test]
    fn test_identical_consecutive_events_tolerated() {
        let duplicated = EventSequence::from_events(vec![
            event(500, "SERVE_P1", 1, 0),
            event(500, "SERVE_P1", 1, 0),
        ]);
        let mut engine = ReplayEngine::new(duplicated);
        engine.start().unwrap();

        let first = engine.advance().unwrap();
        let second = engine.advance().unwrap();
        assert_eq!(first.display, second.display);
        assert!(second.terminal);
    }

    // ========================================================================
    // Determinism
    // ========================================================================

    #[test]
    fn test_replay_determinism_across_reset() {
        let mut engine = ReplayEngine::new(rally_sequence());

        engine.start().unwrap();
        let first_run = engine.run_to_end().unwrap();

        engine.reset();
        engine.start().unwrap();
        let second_run = engine.run_to_end().unwrap();

        assert_eq!(first_run, second_run);
        assert_eq!(display_digest(&first_run), display_digest(&second_run));
    }

    #[test]
    fn test_run_to_end_collects_one_display_per_event() {
        let mut engine = ReplayEngine::new(rally_sequence());
        engine.start().unwrap();
        let displays = engine.run_to_end().unwrap();
        assert_eq!(displays.len(), 3);
        assert_eq!(engine.state(), EngineState::Exhausted);
    }

    // ========================================================================
    // Win Flag Policy
    // ========================================================================

    fn conflicted_sequence() -> EventSequence {
        let mut conflicted = event(100, "GAME_OVER", 4, 4);
        conflicted.win1 = true;
        conflicted.win2 = true;
        EventSequence::from_events(vec![event(0, "IDLE", 0, 0), conflicted])
    }

    #[test]
    fn test_permissive_policy_keeps_player1_banner() {
        let mut engine = ReplayEngine::new(conflicted_sequence());
        engine.start().unwrap();
        engine.advance().unwrap();

        let outcome = engine.advance().unwrap();
        assert_eq!(outcome.display.win_message, Some(PLAYER1_WIN_MESSAGE));
        assert!(outcome.terminal);
    }

    #[test]
    fn test_warn_policy_still_consumes() {
        let mut engine = ReplayEngine::with_policy(conflicted_sequence(), WinFlagPolicy::Warn);
        engine.start().unwrap();
        engine.advance().unwrap();

        let outcome = engine.advance().unwrap();
        assert_eq!(outcome.display.win_message, Some(PLAYER1_WIN_MESSAGE));
        assert_eq!(engine.cursor(), 2);
    }

    #[test]
    fn test_strict_policy_rejects_without_consuming() {
        let mut engine = ReplayEngine::with_policy(conflicted_sequence(), WinFlagPolicy::Strict);
        engine.start().unwrap();
        engine.advance().unwrap();

        let err = engine.advance().unwrap_err();
        assert_eq!(err, TransitionError::ConflictingWinFlags { cursor: 1 });
        assert_eq!(engine.cursor(), 1, "failed advance must not consume");
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.display().win_message, None);
    }

    #[test]
    fn test_win_banner_variants() {
        let mut won = event(100, "GAME_OVER", 4, 2);
        won.win1 = true;
        let sequence = EventSequence::from_events(vec![won]);

        let mut engine = ReplayEngine::new(sequence);
        engine.start().unwrap();
        let outcome = engine.advance().unwrap();
        assert_eq!(outcome.display.win_message, Some(PLAYER1_WIN_MESSAGE));

        let sequence = EventSequence::from_events(vec![event(0, "RALLY", 1, 1)]);
        let mut engine = ReplayEngine::new(sequence);
        engine.start().unwrap();
        let outcome = engine.advance().unwrap();
        assert_eq!(outcome.display.win_message, None);
    }
}
