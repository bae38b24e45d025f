//! `courtside play` - paced replay printing one board line per advance.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use courtside_replay::{ReplayEngine, WinFlagPolicy};
use courtside_score::{DisplayState, Serving};
use tracing::info;

use crate::input::load_sequence;

/// Default pacing between advances.
const DEFAULT_INTERVAL_MS: u64 = 500;

#[derive(Args)]
pub struct PlayArgs {
    /// Transcript (or CSV table with --csv) to replay
    #[arg(long)]
    pub input: PathBuf,

    /// Treat the input as a previously exported CSV table
    #[arg(long)]
    pub csv: bool,

    /// Milliseconds between advances
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Fail on an event carrying both win flags
    #[arg(long)]
    pub strict_wins: bool,
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let sequence = load_sequence(&args.input, args.csv)?;
    let policy = if args.strict_wins {
        WinFlagPolicy::Strict
    } else {
        WinFlagPolicy::Permissive
    };

    let mut engine = ReplayEngine::with_policy(sequence, policy);
    let interval = Duration::from_millis(args.interval_ms);

    engine.start()?;
    info!(events = engine.sequence().len(), "replay started");

    loop {
        let before = engine.cursor();
        let outcome = engine.advance()?;
        if engine.cursor() > before {
            println!("{}", board_line(&outcome.display));
        }
        if outcome.terminal {
            break;
        }
        thread::sleep(interval);
    }

    info!("replay complete");
    Ok(())
}

/// Render one display state as a board line.
///
/// The serving marker sits next to the serving player's score, the three
/// set columns follow each score, and the win banner closes the line.
fn board_line(display: &DisplayState) -> String {
    let (p1_mark, p2_mark) = match display.serving {
        Serving::PlayerOne => ('*', ' '),
        Serving::PlayerTwo => (' ', '*'),
        Serving::None => (' ', ' '),
    };

    let sets = |columns: &[u32]| {
        columns
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut line = format!(
        "P1{p1_mark}{:>3} [{}] | P2{p2_mark}{:>3} [{}] | phase {} | {}",
        display.p1_score,
        sets(&display.p1_sets),
        display.p2_score,
        sets(&display.p2_sets),
        display.phase,
        display.state,
    );

    if let Some(banner) = display.win_message {
        line.push_str(" | ");
        line.push_str(banner);
    }

    line
}
