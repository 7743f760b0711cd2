//! Task data structure and related functionality.
//!
//! A `Task` is one quest on the checklist. Besides its lifecycle status it
//! carries three sub-level flags (a one-time celebration fires when all are set)
//! and an independent list of subtasks.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::fields::Status;

pub const MIN_ESTIMATE_MIN: u32 = 5;
pub const MIN_URGENCY: u8 = 1;
pub const MAX_URGENCY: u8 = 5;
pub const SUBLEVEL_COUNT: usize = 3;

/// Clamp an estimate to the minimum allowed duration.
pub fn clamp_estimate(estimate_min: u32) -> u32 {
    estimate_min.max(MIN_ESTIMATE_MIN)
}

/// Clamp an urgency into `1..=5`. Accepts any integer so CLI input never fails.
pub fn clamp_urgency(urgency: i64) -> u8 {
    urgency.clamp(i64::from(MIN_URGENCY), i64::from(MAX_URGENCY)) as u8
}

/// Round a stored number to whole units; non-finite values become 0.
fn whole_number(raw: f64) -> i64 {
    if raw.is_finite() {
        raw.round() as i64
    } else {
        0
    }
}

/// Estimates may have been saved as fractional minutes.
fn lenient_estimate<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    let minutes = whole_number(raw).clamp(0, i64::from(u32::MAX)) as u32;
    Ok(clamp_estimate(minutes))
}

fn lenient_urgency<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    Ok(clamp_urgency(whole_number(raw)))
}

/// A checklist item under a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

/// A quest on the checklist.
///
/// `status == Done` and `done == true` always agree; `done` is kept for blobs
/// written before `status` existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub done: bool,
    #[serde(deserialize_with = "lenient_estimate")]
    pub estimate_min: u32,
    #[serde(deserialize_with = "lenient_urgency")]
    pub urgency: u8,
    pub created_at: i64,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub finished_at: Option<i64>,
    #[serde(default)]
    pub actual_min: Option<u32>,
    #[serde(default)]
    pub sub_levels: [bool; SUBLEVEL_COUNT],
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Build a fresh `todo` task, clamping estimate and urgency.
    pub fn new(title: impl Into<String>, estimate_min: u32, urgency: i64, created_at: i64) -> Self {
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            status: Status::Todo,
            done: false,
            estimate_min: clamp_estimate(estimate_min),
            urgency: clamp_urgency(urgency),
            created_at,
            started_at: None,
            finished_at: None,
            actual_min: None,
            sub_levels: [false; SUBLEVEL_COUNT],
            subtasks: Vec::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == Status::Done || self.done
    }

    /// Set the status and keep the legacy `done` flag in step.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        self.done = status == Status::Done;
    }

    /// Reconcile `status` and `done` on a task read from an older blob and
    /// pull estimate and urgency back into range.
    pub fn normalise(&mut self) {
        self.estimate_min = clamp_estimate(self.estimate_min);
        self.urgency = clamp_urgency(i64::from(self.urgency));
        if self.done && self.status != Status::Done {
            self.status = Status::Done;
        }
        self.done = self.status == Status::Done;
    }

    /// All three sub-levels are filled.
    pub fn sub_levels_complete(&self) -> bool {
        self.sub_levels.iter().all(|&s| s)
    }

    pub fn sub_levels_filled(&self) -> usize {
        self.sub_levels.iter().filter(|&&s| s).count()
    }

    pub fn subtask_mut(&mut self, id: Uuid) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_clamps_inputs() {
        let t = Task::new("Stretch", 2, 9, 0);
        assert_eq!(t.estimate_min, 5);
        assert_eq!(t.urgency, 5);
        assert_eq!(t.status, Status::Todo);
        assert!(!t.done);
        assert_eq!(t.sub_levels, [false; 3]);
        assert!(t.subtasks.is_empty());

        let t = Task::new("Nap", 45, -3, 0);
        assert_eq!(t.estimate_min, 45);
        assert_eq!(t.urgency, 1);
    }

    #[test]
    fn test_set_status_keeps_done_in_sync() {
        let mut t = Task::new("Email", 10, 3, 0);
        t.set_status(Status::Done);
        assert!(t.done && t.is_done());
        t.set_status(Status::Progress);
        assert!(!t.done && !t.is_done());
    }

    #[test]
    fn test_legacy_task_without_status_normalises_to_done() {
        let raw = r#"{
            "id": "6f1c2f4e-8a47-4f59-9d43-1d7f5b0b8c11",
            "title": "Old quest",
            "done": true,
            "estimateMin": 20,
            "urgency": 3,
            "createdAt": 1700000000000
        }"#;
        let mut t: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(t.status, Status::Todo);
        t.normalise();
        assert_eq!(t.status, Status::Done);
        assert!(t.done);
        assert_eq!(t.sub_levels, [false; 3]);
    }

    #[test]
    fn test_serialises_camel_case() {
        let t = Task::new("Write report", 30, 4, 1);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["estimateMin"], 30);
        assert_eq!(json["subLevels"], serde_json::json!([false, false, false]));
        assert_eq!(json["status"], "todo");
    }

    #[test]
    fn test_fractional_and_out_of_range_numbers_load() {
        let raw = r#"{
            "id": "6f1c2f4e-8a47-4f59-9d43-1d7f5b0b8c11",
            "title": "Quick call",
            "estimateMin": 7.5,
            "urgency": 9,
            "createdAt": 1700000000000
        }"#;
        let t: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(t.estimate_min, 8);
        assert_eq!(t.urgency, 5);

        let raw = raw.replace("7.5", "2").replace("\"urgency\": 9", "\"urgency\": 0.4");
        let t: Task = serde_json::from_str(&raw).unwrap();
        assert_eq!(t.estimate_min, 5);
        assert_eq!(t.urgency, 1);
    }

    #[test]
    fn test_normalise_clamps_numbers() {
        let mut t = Task::new("Edited by hand", 30, 3, 0);
        t.estimate_min = 2;
        t.urgency = 9;
        t.normalise();
        assert_eq!((t.estimate_min, t.urgency), (5, 5));
    }
}
