//! Shared input loading for the subcommands.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use courtside_score::EventSequence;
use courtside_trace::table::read_table;
use courtside_trace::{Extraction, extract_reader};
use tracing::info;

/// Load an event sequence from a transcript, or from a previously exported
/// table when `csv` is set.
pub fn load_sequence(path: &Path, csv: bool) -> Result<EventSequence> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    if csv {
        let events = read_table(file)
            .with_context(|| format!("failed to read table {}", path.display()))?;
        info!(events = events.len(), "table loaded");
        return Ok(events);
    }

    let Extraction { events, report } = extract_reader(BufReader::new(file))
        .with_context(|| format!("failed to scan {}", path.display()))?;
    info!(
        accepted = report.accepted,
        skipped = report.skipped_candidates,
        ignored = report.ignored,
        "transcript scanned"
    );
    Ok(events)
}
