//! `courtside extract` - transcript to CSV table.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use courtside_trace::table::write_table;
use courtside_trace::{Extraction, extract_reader};

#[derive(Args)]
pub struct ExtractArgs {
    /// Captured simulation transcript
    #[arg(long)]
    pub input: PathBuf,

    /// CSV table to write
    #[arg(long)]
    pub output: PathBuf,
}

pub fn execute(args: ExtractArgs) -> Result<()> {
    let transcript = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;

    let Extraction { events, report } = extract_reader(BufReader::new(transcript))
        .with_context(|| format!("failed to scan {}", args.input.display()))?;

    let table = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    write_table(&events, table)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Extracted {} events from {} lines ({} malformed candidates skipped, {} ignored)",
        report.accepted, report.lines_scanned, report.skipped_candidates, report.ignored
    );
    println!("Table written to {}", args.output.display());

    Ok(())
}
