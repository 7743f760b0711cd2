//! Progression rules: XP rewards, the level table and streak milestones.
//!
//! Everything in here is pure. The store calls these functions whenever a task
//! changes status; the CLI and dashboard call them to preview rewards.

/// Base XP for a task of average urgency and short estimate.
pub const BASE_XP_PER_TASK: f64 = 20.0;

/// Streak lengths (in days) that unlock a one-time reward.
pub const STREAK_MILESTONES: [u32; 5] = [3, 7, 14, 21, 30];

/// A named tier unlocked at a cumulative XP threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub id: u8,
    pub name: &'static str,
    pub goal_xp: u32,
    /// Path colour as `#RRGGBB`.
    pub color: &'static str,
    pub flavor: &'static str,
    pub gift: &'static str,
}

/// Static level table, ascending by `id` and strictly increasing `goal_xp`.
pub const LEVELS: [Level; 5] = [
    Level { id: 1, name: "Trailhead", goal_xp: 100, color: "#5B73FF", flavor: "You set out on your journey.", gift: "Shiny Sticker Pack" },
    Level { id: 2, name: "Forest Run", goal_xp: 250, color: "#7F96FF", flavor: "The trees cheer you on.", gift: "Cosmic Cursor" },
    Level { id: 3, name: "Cliffside", goal_xp: 500, color: "#A6BAFF", flavor: "The air is brisk and bright.", gift: "Golden Checkmark" },
    Level { id: 4, name: "Summit", goal_xp: 900, color: "#C8D6FF", flavor: "Clouds part. You glow.", gift: "Dragon Badge" },
    Level { id: 5, name: "Crown Peak", goal_xp: 1400, color: "#E6EDFF", flavor: "Legend status unlocked.", gift: "Aurora Theme" },
];

/// Descriptive reward shown when a streak milestone is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakReward {
    pub days: u32,
    pub title: &'static str,
    pub emoji: &'static str,
    pub note: &'static str,
}

pub const STREAK_REWARDS: [StreakReward; 5] = [
    StreakReward { days: 3, title: "Warm-up Streak", emoji: "🔥", note: "+25 bonus XP" },
    StreakReward { days: 7, title: "One-Week Hero", emoji: "🏅", note: "New theme color" },
    StreakReward { days: 14, title: "Fortnight Focus", emoji: "🌙", note: "Profile badge" },
    StreakReward { days: 21, title: "Momentum Master", emoji: "🚀", note: "Extra confetti" },
    StreakReward { days: 30, title: "Month of Mastery", emoji: "👑", note: "Big XP boost" },
];

/// Motivational one-liners for the once-a-day prompt.
pub const QUOTES: [&str; 6] = [
    "Done is better than perfect.",
    "Tiny steps beat zero steps.",
    "Two minutes now, momentum later.",
    "You don't need more time, just a tiny start.",
    "Make it easy. Reduce friction. Begin.",
    "Progress > procrastination.",
];

/// XP granted for completing a task with the given urgency and estimate.
///
/// `round(BASE × urgency_boost × estimate_boost)` where the urgency boost spans
/// 0.7..=1.3 and the estimate boost grows with the square root of the estimate,
/// saturating at 1.8.
pub fn xp_for_task(urgency: u8, estimate_min: u32) -> u32 {
    let urgency_boost = 1.0 + (f64::from(urgency) - 3.0) * 0.15;
    let estimate_boost = (0.8 + f64::from(estimate_min.max(5)).sqrt() / 5.0).min(1.8);
    (BASE_XP_PER_TASK * urgency_boost * estimate_boost).round().max(0.0) as u32
}

/// Id of the highest level whose goal is at or below `xp`, or 1.
pub fn level_for_xp(xp: u32) -> u8 {
    LEVELS
        .iter()
        .filter(|lvl| xp >= lvl.goal_xp)
        .map(|lvl| lvl.id)
        .last()
        .unwrap_or(LEVELS[0].id)
}

/// Look up a level by id.
pub fn level(id: u8) -> Option<&'static Level> {
    LEVELS.iter().find(|lvl| lvl.id == id)
}

/// Where a given XP total sits on the path between two levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub current: &'static Level,
    pub next: Option<&'static Level>,
    /// XP at which the current stretch of the path starts.
    pub base_xp: u32,
    /// XP at which the current stretch ends.
    pub target_xp: u32,
    /// Fraction of the stretch covered, in `[0, 1]`.
    pub fraction: f64,
}

pub fn level_progress(xp: u32) -> LevelProgress {
    let id = level_for_xp(xp);
    let idx = LEVELS.iter().position(|lvl| lvl.id == id).unwrap_or(0);
    let current = &LEVELS[idx];
    let next = LEVELS.get(idx + 1);
    let base_xp = if idx == 0 { 0 } else { LEVELS[idx - 1].goal_xp };
    let target_xp = next.map(|lvl| lvl.goal_xp).unwrap_or(current.goal_xp);
    let span = target_xp.saturating_sub(base_xp).max(1);
    let fraction = (f64::from(xp.saturating_sub(base_xp)) / f64::from(span)).clamp(0.0, 1.0);
    LevelProgress { current, next, base_xp, target_xp, fraction }
}

/// Reward details for a milestone threshold.
pub fn streak_reward(days: u32) -> Option<&'static StreakReward> {
    STREAK_REWARDS.iter().find(|r| r.days == days)
}

/// Whether `streak` lands exactly on a milestone threshold.
pub fn is_streak_milestone(streak: u32) -> bool {
    STREAK_MILESTONES.contains(&streak)
}
