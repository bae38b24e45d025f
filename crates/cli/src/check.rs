//! `courtside check` - structural validation of an extracted sequence.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use courtside_score::{validate_monotonic_time, validate_win_flags};

use crate::input::load_sequence;

#[derive(Args)]
pub struct CheckArgs {
    /// Transcript (or CSV table with --csv) to validate
    #[arg(long)]
    pub input: PathBuf,

    /// Treat the input as a previously exported CSV table
    #[arg(long)]
    pub csv: bool,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let sequence = load_sequence(&args.input, args.csv)?;
    let events = sequence.events();

    let mut flaws = Vec::new();
    if let Err(flaw) = validate_monotonic_time(events) {
        flaws.push(flaw);
    }
    if let Err(flaw) = validate_win_flags(events) {
        flaws.push(flaw);
    }

    if !flaws.is_empty() {
        for flaw in &flaws {
            eprintln!("flaw: {flaw}");
        }
        bail!("{} structural flaw(s) in {}", flaws.len(), args.input.display());
    }

    println!(
        "{} ok: {} events, digest {:#018x}",
        args.input.display(),
        sequence.len(),
        sequence.digest()
    );

    Ok(())
}
