//! Courtside Trace Extraction
//!
//! This crate turns a captured simulation transcript into an ordered
//! [`EventSequence`]. It defines the shared formats both ends of the
//! pipeline agree on:
//!
//! - the **trace-line grammar** a scoreboard line must match, and the scan
//!   that applies it line-by-line with skip accounting
//! - the **tabular record** layout (fixed-column CSV) written for downstream
//!   consumption and read back for replay (see [`table`])
//!
//! # Scan policy
//!
//! Lines that do not start with the recognizing prefix are ignored without
//! inspection. Prefixed candidates that fail the full grammar are silently
//! skipped: a live capture produces partial and garbled lines, and those
//! are tolerated, only counted. A numeric capture that fails typed
//! conversion after the grammar matched is a defect in the grammar itself
//! and aborts extraction.

#![deny(unsafe_code)]

pub mod table;

use std::fmt;
use std::io::{self, BufRead};
use std::sync::OnceLock;

use courtside_score::{EventSequence, ScoreboardEvent};
use regex::Regex;
use tracing::debug;

// ============================================================================
// Grammar
// ============================================================================

/// Prefix introducing the timestamp field; the cheap pre-filter.
pub const TRACE_PREFIX: &str = "[T=";

/// Full trace-line grammar, anchored at both ends.
///
/// Positional fields: timestamp, phase, bracketed state name (word
/// characters only), paired player scores, paired win-flag digits.
const TRACE_GRAMMAR: &str = r"^\[T=(\d+)\s*ns\]\[PHASE=(\d+)\]\[(\w+)\]\[P1=(\d+)\s*\|\s*P2=(\d+)\]\[WIN1=(\d)\s*WIN2=(\d)\]$";

fn trace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(TRACE_GRAMMAR).expect("trace grammar must compile"))
}

/// Strip the comment marker and surrounding whitespace from a raw line.
///
/// The simulator transcript prefixes console lines with `#`; any mix of
/// leading `#` and spaces is removed before grammar matching.
fn strip_markers(raw: &str) -> &str {
    raw.trim().trim_start_matches(['#', ' ']).trim()
}

/// Re-serialize an event into the trace wire format.
///
/// Inverse of the grammar: scanning the returned line yields an identical
/// event. Win flags serialize as `0`/`1`.
pub fn format_trace_line(event: &ScoreboardEvent) -> String {
    format!(
        "[T={} ns][PHASE={}][{}][P1={} | P2={}][WIN1={} WIN2={}]",
        event.time_ns,
        event.phase,
        event.state,
        event.p1_score,
        event.p2_score,
        u8::from(event.win1),
        u8::from(event.win2),
    )
}

// ============================================================================
// Line Outcomes
// ============================================================================

/// Classification of one scanned line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Line matched the full grammar; carries the decoded event.
    Accepted(ScoreboardEvent),
    /// Line carried the trace prefix but failed the full grammar.
    SkippedCandidate,
    /// Line without the prefix; not inspected further.
    Ignored,
}

/// Scan a single raw line.
///
/// `line_number` is 1-based and used only for diagnostics. Returns an error
/// only for the fatal conversion case; malformed candidates come back as
/// [`LineOutcome::SkippedCandidate`].
pub fn scan_line(raw: &str, line_number: usize) -> Result<LineOutcome, ExtractError> {
    let line = strip_markers(raw);
    if !line.starts_with(TRACE_PREFIX) {
        return Ok(LineOutcome::Ignored);
    }

    let Some(captures) = trace_pattern().captures(line) else {
        debug!(line_number, "candidate line failed grammar, skipping");
        return Ok(LineOutcome::SkippedCandidate);
    };

    let event = ScoreboardEvent {
        time_ns: parse_capture(&captures, 1, "T", line_number)?,
        phase: parse_capture(&captures, 2, "PHASE", line_number)?,
        state: captures[3].to_string(),
        p1_score: parse_capture(&captures, 4, "P1", line_number)?,
        p2_score: parse_capture(&captures, 5, "P2", line_number)?,
        win1: &captures[6] == "1",
        win2: &captures[7] == "1",
    };

    Ok(LineOutcome::Accepted(event))
}

/// Convert one digit-run capture to its typed field.
///
/// The grammar only captures digit runs here, so the sole reachable failure
/// is numeric overflow of the target type. That is still a grammar/converter
/// pairing defect, reported as fatal rather than skipped.
fn parse_capture<T: std::str::FromStr>(
    captures: &regex::Captures<'_>,
    group: usize,
    field: &'static str,
    line_number: usize,
) -> Result<T, ExtractError> {
    let value = &captures[group];
    value
        .parse()
        .map_err(|_| ExtractError::CaptureConversion {
            line_number,
            field,
            value: value.to_string(),
        })
}

// ============================================================================
// Stream Extraction
// ============================================================================

/// Per-scan accounting.
///
/// `lines_scanned` always equals `accepted + skipped_candidates + ignored`.
/// The skip count is observable for diagnostics; the scan itself never
/// surfaces skips as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanReport {
    pub lines_scanned: usize,
    pub accepted: usize,
    pub skipped_candidates: usize,
    pub ignored: usize,
}

/// Result of a full extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub events: EventSequence,
    pub report: ScanReport,
}

/// Extract an event sequence from in-memory lines.
///
/// The stream is read once, in order; events come out in scan order.
pub fn extract_lines<'a, I>(lines: I) -> Result<Extraction, ExtractError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut events = Vec::new();
    let mut report = ScanReport::default();

    for (index, raw) in lines.into_iter().enumerate() {
        scan_into(raw, index + 1, &mut events, &mut report)?;
    }

    Ok(Extraction {
        events: EventSequence::from_events(events),
        report,
    })
}

/// Extract an event sequence from a buffered reader.
pub fn extract_reader<R: BufRead>(reader: R) -> Result<Extraction, ExtractError> {
    let mut events = Vec::new();
    let mut report = ScanReport::default();

    for (index, raw) in reader.lines().enumerate() {
        let raw = raw.map_err(ExtractError::Io)?;
        scan_into(&raw, index + 1, &mut events, &mut report)?;
    }

    Ok(Extraction {
        events: EventSequence::from_events(events),
        report,
    })
}

fn scan_into(
    raw: &str,
    line_number: usize,
    events: &mut Vec<ScoreboardEvent>,
    report: &mut ScanReport,
) -> Result<(), ExtractError> {
    report.lines_scanned += 1;
    match scan_line(raw, line_number)? {
        LineOutcome::Accepted(event) => {
            report.accepted += 1;
            events.push(event);
        }
        LineOutcome::SkippedCandidate => report.skipped_candidates += 1,
        LineOutcome::Ignored => report.ignored += 1,
    }
    Ok(())
}

// ============================================================================
// Extraction Errors
// ============================================================================

/// Fatal extraction failure. Malformed lines are not errors; see the scan
/// policy in the crate docs.
#[derive(Debug)]
pub enum ExtractError {
    /// A grammar-matched capture failed typed conversion.
    CaptureConversion {
        line_number: usize,
        field: &'static str,
        value: String,
    },
    /// The underlying reader failed.
    Io(io::Error),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaptureConversion {
                line_number,
                field,
                value,
            } => {
                write!(
                    f,
                    "line {line_number}: captured {field} value {value:?} failed conversion"
                )
            }
            Self::Io(err) => write!(f, "transcript read failed: {err}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::CaptureConversion { .. } => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
