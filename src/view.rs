//! Plain-text rendering helpers for command output.

use chrono::{Local, TimeZone};

use crate::db::GameState;
use crate::fields::Status;
use crate::game::{level_progress, xp_for_task};
use crate::task::Task;

/// Format a task status for display.
pub fn format_status(s: Status) -> &'static str {
    match s {
        Status::Todo => "Todo",
        Status::Progress => "Progress",
        Status::Done => "Done",
    }
}

/// Sub-level pips, e.g. `●●○`.
pub fn format_sub_levels(task: &Task) -> String {
    task.sub_levels.iter().map(|&s| if s { '●' } else { '○' }).collect()
}

/// `mm:ss` countdown.
pub fn format_countdown(remaining_ms: i64) -> String {
    let secs = remaining_ms.max(0) / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Minutes as `45m` or `1h30m`.
pub fn format_minutes(minutes: u32) -> String {
    if minutes < 60 {
        format!("{minutes}m")
    } else if minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}h{:02}m", minutes / 60, minutes % 60)
    }
}

/// Local wall-clock time for a millisecond timestamp.
pub fn format_timestamp(ms: Option<i64>) -> String {
    ms.and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

pub fn format_streak(streak: u32) -> String {
    let days = streak.max(1);
    format!("{days} day{}", if days == 1 { "" } else { "s" })
}

/// Text progress bar of the given width.
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Short id shown in listings; any unique prefix resolves back to the task.
pub fn short_id(task: &Task) -> String {
    task.id.simple().to_string()[..8].to_string()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<9} {:<9} {:>6} {:>4} {:>5} {:<4} {}",
        "ID", "Status", "Est", "Urg", "XP", "Lvl", "Title"
    );
    for t in tasks {
        let subtasks = if t.subtasks.is_empty() {
            String::new()
        } else {
            let done = t.subtasks.iter().filter(|s| s.done).count();
            format!(" ({}/{})", done, t.subtasks.len())
        };
        println!(
            "{:<9} {:<9} {:>6} {:>4} {:>5} {:<4} {}{}",
            short_id(t),
            format_status(t.status),
            format_minutes(t.estimate_min),
            t.urgency,
            format!("+{}", xp_for_task(t.urgency, t.estimate_min)),
            format_sub_levels(t),
            truncate(&t.title, 48),
            subtasks
        );
    }
}

/// One-line summary of level, XP and streak.
pub fn stats_line(state: &GameState) -> String {
    let p = level_progress(state.xp);
    let goal = match p.next {
        Some(next) => format!("{} / {} XP", state.xp, next.goal_xp),
        None => format!("{} XP (max level!)", state.xp),
    };
    format!(
        "Level {} {}  {} {}  Streak {}",
        p.current.id,
        p.current.name,
        progress_bar(p.fraction, 20),
        goal,
        format_streak(state.streak)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(95), "1h35m");
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(15 * 60_000), "15:00");
        assert_eq!(format_countdown(61_999), "01:01");
        assert_eq!(format_countdown(-5), "00:00");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.5, 4), "[##--]");
        assert_eq!(progress_bar(2.0, 3), "[###]");
    }

    #[test]
    fn test_format_streak_never_shows_zero() {
        assert_eq!(format_streak(0), "1 day");
        assert_eq!(format_streak(5), "5 days");
    }

    #[test]
    fn test_stats_line_mentions_next_goal() {
        let state = GameState { xp: 41, ..GameState::default() };
        let line = stats_line(&state);
        assert!(line.contains("Trailhead"));
        assert!(line.contains("41 / 250 XP"));
    }
}
