//! Enumerations shared by the store, the CLI and the dashboard.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle of a task: `todo → progress → done`, with undo back to `todo`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    #[serde(alias = "open")]
    Todo,
    #[serde(alias = "in-progress")]
    Progress,
    Done,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::Progress => "progress",
            Status::Done => "done",
        }
    }
}

/// Which tasks a listing shows.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ListFilter {
    Pending,
    Done,
    All,
}

/// Unit an estimate is entered in.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum EstimateUnit {
    Min,
    H,
}

impl EstimateUnit {
    /// Convert an entered amount to whole minutes.
    pub fn to_minutes(self, amount: f64) -> u32 {
        let minutes = match self {
            EstimateUnit::Min => amount,
            EstimateUnit::H => amount * 60.0,
        };
        minutes.round().max(0.0) as u32
    }
}
