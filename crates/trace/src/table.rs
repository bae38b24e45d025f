//! Tabular record sink/source for extracted sequences.
//!
//! Fixed column order, one header row, one row per accepted event, win
//! flags as `0`/`1`. Unlike the transcript scan, a table is trusted input
//! produced by this pipeline: malformed rows are errors here, never skips.

use std::fmt;
use std::io::{self, Read, Write};

use courtside_score::{EventSequence, ScoreboardEvent};

/// Fixed column order of the exported table.
pub const TABLE_HEADER: [&str; 7] = [
    "Time_ns", "Phase", "State", "P1_Score", "P2_Score", "WIN1", "WIN2",
];

// ============================================================================
// Writing
// ============================================================================

/// Write the sequence as a table: header row, then one row per event.
pub fn write_table<W: Write>(events: &EventSequence, writer: W) -> Result<(), TableError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(TABLE_HEADER)?;

    for event in events {
        out.write_record([
            event.time_ns.to_string(),
            event.phase.to_string(),
            event.state.clone(),
            event.p1_score.to_string(),
            event.p2_score.to_string(),
            flag_text(event.win1).to_string(),
            flag_text(event.win2).to_string(),
        ])?;
    }

    out.flush()?;
    Ok(())
}

fn flag_text(flag: bool) -> &'static str {
    if flag { "1" } else { "0" }
}

// ============================================================================
// Reading
// ============================================================================

/// Read a previously written table back into an event sequence.
///
/// The header row must match [`TABLE_HEADER`] exactly; every field must
/// parse as its typed column.
pub fn read_table<R: Read>(reader: R) -> Result<EventSequence, TableError> {
    let mut input = csv::Reader::from_reader(reader);

    let headers = input.headers()?.clone();
    if headers.iter().ne(TABLE_HEADER) {
        return Err(TableError::Header {
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut events = Vec::new();
    for (index, record) in input.records().enumerate() {
        let record = record?;
        let row = index + 2; // 1-based, after the header row

        events.push(ScoreboardEvent {
            time_ns: parse_field(&record, row, 0)?,
            phase: parse_field(&record, row, 1)?,
            state: field(&record, row, 2)?.to_string(),
            p1_score: parse_field(&record, row, 3)?,
            p2_score: parse_field(&record, row, 4)?,
            win1: parse_flag(&record, row, 5)?,
            win2: parse_flag(&record, row, 6)?,
        });
    }

    Ok(EventSequence::from_events(events))
}

fn field<'r>(record: &'r csv::StringRecord, row: usize, column: usize) -> Result<&'r str, TableError> {
    record.get(column).ok_or(TableError::MissingField {
        row,
        column: TABLE_HEADER[column],
    })
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    row: usize,
    column: usize,
) -> Result<T, TableError> {
    let value = field(record, row, column)?;
    value.parse().map_err(|_| TableError::InvalidField {
        row,
        column: TABLE_HEADER[column],
        value: value.to_string(),
    })
}

fn parse_flag(record: &csv::StringRecord, row: usize, column: usize) -> Result<bool, TableError> {
    match field(record, row, column)? {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(TableError::InvalidField {
            row,
            column: TABLE_HEADER[column],
            value: other.to_string(),
        }),
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Failure reading or writing the tabular record.
#[derive(Debug)]
pub enum TableError {
    /// Header row does not match the fixed column order.
    Header { found: Vec<String> },
    /// A row is missing a column.
    MissingField { row: usize, column: &'static str },
    /// A field failed typed conversion.
    InvalidField {
        row: usize,
        column: &'static str,
        value: String,
    },
    /// Underlying CSV failure (I/O, quoting, row width).
    Csv(csv::Error),
    Io(io::Error),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header { found } => {
                write!(
                    f,
                    "table header mismatch: expected {:?}, found {:?}",
                    TABLE_HEADER, found
                )
            }
            Self::MissingField { row, column } => {
                write!(f, "row {row}: missing {column} field")
            }
            Self::InvalidField { row, column, value } => {
                write!(f, "row {row}: {column} value {value:?} failed conversion")
            }
            Self::Csv(err) => write!(f, "table record failure: {err}"),
            Self::Io(err) => write!(f, "table write failed: {err}"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<io::Error> for TableError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

// ============================================================================
// Tests
// ============================================================================
