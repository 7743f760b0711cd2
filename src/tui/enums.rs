//! Enumerations for TUI state management.

use uuid::Uuid;

/// Which screen has keyboard focus.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    Dashboard,
    AddTask,
    Help,
    Confirm(ConfirmAction),
    Modal(Modal),
}

/// Destructive actions that ask first.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ConfirmAction {
    Delete(Uuid),
    ClearDone,
}

/// Celebratory overlays, in the order they are offered.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Modal {
    LevelUp(u8),
    Milestone(Uuid),
    StreakReward(u32),
    DailyQuote,
}

/// Field focused in the add-task form.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AddField {
    Title,
    Estimate,
    Urgency,
}

impl AddField {
    pub fn next(self) -> Self {
        match self {
            AddField::Title => AddField::Estimate,
            AddField::Estimate => AddField::Urgency,
            AddField::Urgency => AddField::Title,
        }
    }
}
