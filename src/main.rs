//! # quest - gamified task tracker
//!
//! A single-user checklist where finishing tasks earns experience points,
//! XP climbs a five-level path, and completing at least one task per calendar
//! day keeps a streak alive. Runs as a CLI for quick capture or as an
//! interactive terminal dashboard.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a quest worth XP based on urgency (1-5) and estimate
//! quest add "Write the report intro" --estimate 30 --urgency 4
//!
//! # Complete it (ID prefix or title both work)
//! quest done "Write the report intro"
//!
//! # Launch the dashboard
//! quest ui
//! ```
//!
//! ## How it works
//!
//! - **XP**: `round(20 × urgency factor × effort factor)`, where the effort
//!   factor grows with the square root of the estimate and caps at 1.8.
//! - **Levels**: Trailhead, Forest Run, Cliffside, Summit, Crown Peak.
//! - **Streaks**: one completion per local day; 3, 7, 14, 21 and 30 days
//!   unlock a reward to claim.
//! - **Sprints**: timed focus sessions that stop on their own when the
//!   deadline passes.
//!
//! State is stored in `~/.questlist/questlist-v1.json` (override with `--db`
//! or `QUESTLIST_DB`). Set `QUESTLIST_LOG=debug` or pass `--verbose` to see
//! what the store is doing.

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod clock;
pub mod cmd;
pub mod db;
pub mod error;
pub mod fields;
pub mod game;
pub mod store;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod utils;
}

use cli::{resolve_db_path, Cli};
use cmd::*;
use db::FileStorage;
use store::Store;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "QUESTLIST_LOG";

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Completions never touch the state file
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    let storage = FileStorage::new(resolve_db_path(cli.db));
    tracing::debug!(path = %storage.path().display(), "opening state file");
    let mut store = Store::load(storage);

    run_command(&mut store, cli.command);
}
