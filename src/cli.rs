use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::db::STORAGE_KEY;

/// Gamified task tracker: finish quests, earn XP, keep the streak alive.
/// State lives in ~/.questlist/questlist-v1.json unless --db says otherwise.
#[derive(Parser)]
#[command(name = "quest", version, about = "Gamified daily task tracker")]
pub struct Cli {
    /// Path to the JSON state file.
    #[arg(long, global = true, env = "QUESTLIST_DB")]
    pub db: Option<PathBuf>,

    /// Log store activity to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Resolve the state file: `--db`, `$QUESTLIST_DB`, then `$HOME/.questlist/`.
pub fn resolve_db_path(db: Option<PathBuf>) -> PathBuf {
    db.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".questlist").join(format!("{STORAGE_KEY}.json"))
    })
}
