//! Courtside Scoreboard Model
//!
//! This crate contains the shared scoreboard data model: the typed decoding
//! of one trace line (`ScoreboardEvent`), the ordered event collection the
//! replay engine consumes (`EventSequence`), and the pure derivation rules
//! that turn an event into presentation-facing state (`DisplayState`).
//!
//! # Architecture Constraints
//!
//! The model crate MUST NOT:
//! - Perform I/O operations (file, terminal, etc.)
//! - Read wall-clock time
//! - Hold any replay cursor or engine state
//!
//! Extraction and replay both depend on this crate; it depends on nothing.

#![deny(unsafe_code)]

use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Simulation timestamp in nanoseconds.
pub type TimeNs = u64;

/// Simulation phase identifier. A recorded fact with no ordering constraint.
pub type Phase = u32;

// ============================================================================
// Scoreboard Event
// ============================================================================

/// The typed decoding of one accepted trace line; the unit of replay.
///
/// `time_ns` is expected to be monotonically non-decreasing across a
/// sequence scanned from a chronologically generated transcript. The
/// extractor passes violations through as-is; [`validate_monotonic_time`]
/// flags them.
///
/// At most one of `win1`/`win2` is meaningful per event. Mutual exclusion is
/// assumed, not enforced; [`validate_win_flags`] and the replay engine's
/// strict mode exist for callers that want it checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardEvent {
    pub time_ns: TimeNs,
    pub phase: Phase,
    /// Internal state name of the scoreboard design (e.g. `SERVE_P1_WAIT`).
    /// Opaque to extraction; inspected only for serve-side derivation.
    pub state: String,
    pub p1_score: u32,
    pub p2_score: u32,
    pub win1: bool,
    pub win2: bool,
}

// ============================================================================
// Event Sequence
// ============================================================================

/// Ordered, immutable-once-built collection of scoreboard events.
///
/// Built once from a full scan of the input stream and owned exclusively by
/// the replay engine afterwards. A reset re-derives display state from the
/// same sequence; it never re-parses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventSequence {
    events: Vec<ScoreboardEvent>,
}

impl EventSequence {
    /// Build a sequence from events in scan order.
    pub fn from_events(events: Vec<ScoreboardEvent>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScoreboardEvent> {
        self.events.get(index)
    }

    pub fn events(&self) -> &[ScoreboardEvent] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoreboardEvent> {
        self.events.iter()
    }

    /// Compute the sequence digest.
    ///
    /// Algorithm: FNV-1a 64-bit over every field of every event in order,
    /// fixed-width integers little-endian, strings length-prefixed. Two
    /// sequences with equal digests replayed from reset produce identical
    /// display-state sequences.
    pub fn digest(&self) -> u64 {
        let mut hasher = Fnv1a64::new();
        hasher.update(&(self.events.len() as u64).to_le_bytes());
        for event in &self.events {
            hash_event(&mut hasher, event);
        }
        hasher.finish()
    }
}

impl<'a> IntoIterator for &'a EventSequence {
    type Item = &'a ScoreboardEvent;
    type IntoIter = std::slice::Iter<'a, ScoreboardEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// ============================================================================
// Serve Derivation
// ============================================================================

/// Player marker token searched for in state names (first match wins).
const P1_MARKER: &str = "p1";

/// Second player marker token.
const P2_MARKER: &str = "p2";

/// Which player the scoreboard currently shows as serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Serving {
    #[default]
    None,
    PlayerOne,
    PlayerTwo,
}

impl Serving {
    /// Derive the serving side from a state name.
    ///
    /// Case-insensitive substring inspection: a name containing `p1` serves
    /// player one, else a name containing `p2` serves player two, else
    /// nobody. The markers are checked in that order, so a name containing
    /// both yields player one; callers relying on ambiguous names get the
    /// first match, not an error.
    pub fn from_state_name(state: &str) -> Self {
        let lowered = state.to_ascii_lowercase();
        if lowered.contains(P1_MARKER) {
            Self::PlayerOne
        } else if lowered.contains(P2_MARKER) {
            Self::PlayerTwo
        } else {
            Self::None
        }
    }
}

// ============================================================================
// Win Banner
// ============================================================================

/// Banner text shown when player 1 wins.
pub const PLAYER1_WIN_MESSAGE: &str = "Player 1 Wins!";

/// Banner text shown when player 2 wins.
pub const PLAYER2_WIN_MESSAGE: &str = "Player 2 Wins!";

/// Derive the win banner from the event's win flags.
///
/// `win1` is inspected first; an event carrying both flags yields player 1's
/// banner. Mutual exclusion is not validated here.
pub fn win_message(win1: bool, win2: bool) -> Option<&'static str> {
    if win1 {
        Some(PLAYER1_WIN_MESSAGE)
    } else if win2 {
        Some(PLAYER2_WIN_MESSAGE)
    } else {
        None
    }
}

// ============================================================================
// Display State
// ============================================================================

/// State label shown before any event has been consumed.
pub const RESET_STATE_LABEL: &str = "NORMAL";

/// Number of set-score columns on the board.
pub const SET_COLUMNS: usize = 3;

/// Presentation-facing state derived from one consumed event.
///
/// Transient: recomputed fully on each advance and handed to the caller,
/// never persisted. The set columns are placeholders: the board renders
/// three set digits per player that the transcript never drives, so they
/// stay zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub serving: Serving,
    pub win_message: Option<&'static str>,
    pub p1_score: u32,
    pub p2_score: u32,
    pub p1_sets: [u32; SET_COLUMNS],
    pub p2_sets: [u32; SET_COLUMNS],
    pub phase: Phase,
    pub state: String,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            serving: Serving::None,
            win_message: None,
            p1_score: 0,
            p2_score: 0,
            p1_sets: [0; SET_COLUMNS],
            p2_sets: [0; SET_COLUMNS],
            phase: 0,
            state: RESET_STATE_LABEL.to_string(),
        }
    }
}

impl DisplayState {
    /// Derive the full display state from one event.
    ///
    /// Scores, phase and state name pass through verbatim; serving and the
    /// win banner are derived per the rules above.
    pub fn from_event(event: &ScoreboardEvent) -> Self {
        Self {
            serving: Serving::from_state_name(&event.state),
            win_message: win_message(event.win1, event.win2),
            p1_score: event.p1_score,
            p2_score: event.p2_score,
            p1_sets: [0; SET_COLUMNS],
            p2_sets: [0; SET_COLUMNS],
            phase: event.phase,
            state: event.state.clone(),
        }
    }
}

/// Compute a digest over an ordered run of display states.
///
/// Companion to [`EventSequence::digest`]; replay determinism tests compare
/// two runs by digest instead of element-by-element.
pub fn display_digest(states: &[DisplayState]) -> u64 {
    let mut hasher = Fnv1a64::new();
    hasher.update(&(states.len() as u64).to_le_bytes());
    for display in states {
        hasher.update(&[match display.serving {
            Serving::None => 0u8,
            Serving::PlayerOne => 1,
            Serving::PlayerTwo => 2,
        }]);
        hash_str(&mut hasher, display.win_message.unwrap_or(""));
        hasher.update(&display.p1_score.to_le_bytes());
        hasher.update(&display.p2_score.to_le_bytes());
        hasher.update(&display.phase.to_le_bytes());
        hash_str(&mut hasher, &display.state);
    }
    hasher.finish()
}

// ============================================================================
// Sequence Validation
// ============================================================================

/// Structural flaw found in an event sequence.
///
/// Validation is a separate pass: the extractor never corrects or rejects a
/// structurally flawed sequence, it only reports what the transcript said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceFlaw {
    /// Timestamp decreased relative to the previous event.
    DecreasingTime {
        index: usize,
        prev_time_ns: TimeNs,
        time_ns: TimeNs,
    },
    /// Both win flags set in a single event.
    ConflictingWinFlags { index: usize },
}

impl fmt::Display for SequenceFlaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecreasingTime {
                index,
                prev_time_ns,
                time_ns,
            } => {
                write!(
                    f,
                    "event {index}: timestamp {time_ns} ns decreases below previous {prev_time_ns} ns"
                )
            }
            Self::ConflictingWinFlags { index } => {
                write!(f, "event {index}: both win flags set")
            }
        }
    }
}

impl std::error::Error for SequenceFlaw {}

/// Check that timestamps are monotonically non-decreasing.
///
/// Returns the first offending index on failure. Equal adjacent timestamps
/// are allowed; repeated identical lines are a normal transcript artifact.
pub fn validate_monotonic_time(events: &[ScoreboardEvent]) -> Result<(), SequenceFlaw> {
    for (index, pair) in events.windows(2).enumerate() {
        if pair[1].time_ns < pair[0].time_ns {
            return Err(SequenceFlaw::DecreasingTime {
                index: index + 1,
                prev_time_ns: pair[0].time_ns,
                time_ns: pair[1].time_ns,
            });
        }
    }
    Ok(())
}

/// Check that no event carries both win flags.
pub fn validate_win_flags(events: &[ScoreboardEvent]) -> Result<(), SequenceFlaw> {
    for (index, event) in events.iter().enumerate() {
        if event.win1 && event.win2 {
            return Err(SequenceFlaw::ConflictingWinFlags { index });
        }
    }
    Ok(())
}

// ============================================================================
// Digest Implementation
// ============================================================================

/// FNV-1a 64-bit offset basis.
const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime.
const FNV1A_PRIME: u64 = 0x100000001b3;

/// FNV-1a 64-bit hasher backing the sequence and display digests.
#[derive(Debug, Clone)]
struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    fn finish(self) -> u64 {
        self.state
    }
}

/// Length-prefix strings so adjacent fields cannot alias.
fn hash_str(hasher: &mut Fnv1a64, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

fn hash_event(hasher: &mut Fnv1a64, event: &ScoreboardEvent) {
    hasher.update(&event.time_ns.to_le_bytes());
    hasher.update(&event.phase.to_le_bytes());
    hash_str(hasher, &event.state);
    hasher.update(&event.p1_score.to_le_bytes());
    hasher.update(&event.p2_score.to_le_bytes());
    hasher.update(&[u8::from(event.win1), u8::from(event.win2)]);
}

// ============================================================================
// Tests
// ============================================================================
