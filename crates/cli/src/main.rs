//! Courtside CLI - replay driver for tennis-scoreboard simulation logs
//!
//! # Commands
//!
//! - `courtside extract` - Scan a simulation transcript into a CSV table
//! - `courtside play` - Replay a transcript or table, one board per tick
//! - `courtside check` - Validate a sequence and print its digest
//!
//! # Usage
//!
//! ```bash
//! # Turn a captured ModelSim transcript into the score table
//! courtside extract --input msim_transcript --output scores.csv
//!
//! # Step through the match at the board's own pace
//! courtside play --input msim_transcript
//!
//! # Replay a previously exported table, faster, strict about win flags
//! courtside play --input scores.csv --csv --interval-ms 100 --strict-wins
//!
//! # Structural validation (monotonic time, exclusive win flags)
//! courtside check --input scores.csv --csv
//! ```

mod check;
mod extract;
mod input;
mod play;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Replay driver for tennis-scoreboard simulation logs
#[derive(Parser)]
#[command(name = "courtside")]
#[command(about = "Replay driver for tennis-scoreboard simulation logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a simulation transcript into a CSV table
    Extract(extract::ExtractArgs),

    /// Replay a transcript or table, printing one board line per tick
    Play(play::PlayArgs),

    /// Validate a sequence and print its digest
    Check(check::CheckArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => extract::execute(args),
        Commands::Play(args) => play::execute(args),
        Commands::Check(args) => check::execute(args),
    }
}
