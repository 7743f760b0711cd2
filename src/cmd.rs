//! Command implementations for the CLI interface.
//!
//! Each subcommand maps onto one store operation (or a read-only view of the
//! store) and reports what changed: XP earned, level-ups, streak rewards and
//! milestones waiting to be celebrated.

use std::io::Write;
use std::thread;
use std::time::Duration;

use chrono::Datelike;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use uuid::Uuid;

use crate::db::GameState;
use crate::fields::*;
use crate::game::{level, level_progress, streak_reward, xp_for_task, LEVELS, QUOTES};
use crate::store::Store;
use crate::task::Task;
use crate::tui::run::run_tui;
use crate::view::*;

/// How often `sprint watch` polls the deadline.
const SPRINT_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive dashboard.
    Ui,

    /// Add a new quest.
    Add {
        /// Short title for the task.
        title: String,
        /// Planned duration (at least 5 minutes).
        #[arg(long, short, default_value_t = 20.0)]
        estimate: f64,
        /// Unit for --estimate: min | h.
        #[arg(long, value_enum, default_value_t = EstimateUnit::Min)]
        unit: EstimateUnit,
        /// Urgency from 1 (whenever) to 5 (on fire). Out-of-range values are clamped.
        #[arg(long, short, default_value_t = 3, allow_negative_numbers = true)]
        urgency: i64,
    },

    /// Start working on a task.
    Start {
        /// Task ID prefix or title.
        id: String,
    },

    /// Complete a task and collect its XP.
    Done {
        /// Task ID prefix or title.
        id: String,
        /// Minutes actually spent; defaults to the time since `start`.
        #[arg(long)]
        actual: Option<u32>,
    },

    /// Flip a task between done and todo.
    Toggle {
        /// Task ID prefix or title.
        id: String,
    },

    /// Set a task's status directly: todo | progress | done.
    Status {
        /// Task ID prefix or title.
        id: String,
        #[arg(value_enum)]
        status: Status,
    },

    /// Change a task's urgency.
    Urgency {
        /// Task ID prefix or title.
        id: String,
        #[arg(allow_negative_numbers = true)]
        urgency: i64,
    },

    /// Toggle one of a task's three sub-levels.
    Sublevel {
        /// Task ID prefix or title.
        id: String,
        /// Sub-level number: 1, 2 or 3.
        #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
        index: u8,
    },

    /// Acknowledge a filled sub-level milestone.
    Celebrate {
        /// Task ID prefix or title; defaults to the pending milestone.
        id: Option<String>,
    },

    /// Manage a task's subtasks.
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },

    /// Delete a task.
    Delete {
        /// Task ID prefix or title.
        id: String,
    },

    /// Remove all completed tasks.
    ClearDone,

    /// Focus sprints.
    Sprint {
        #[command(subcommand)]
        action: SprintAction,
    },

    /// Toggle focus mode.
    Focus,

    /// Claim the pending streak reward.
    Claim,

    /// Show today's motivational quote.
    Quote,

    /// List tasks.
    List {
        #[arg(long, value_enum, default_value_t = ListFilter::Pending)]
        filter: ListFilter,
    },

    /// Show a single task in detail.
    Show {
        /// Task ID prefix or title.
        id: String,
    },

    /// Show level, XP, streak and anything waiting to be claimed.
    Stats,

    /// Show the level path.
    Levels,

    /// Suggest the quickest pending task.
    QuickWin,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Add a subtask.
    Add {
        /// Task ID prefix or title.
        task: String,
        title: String,
    },
    /// Toggle a subtask by its position (1-based).
    Toggle { task: String, number: usize },
    /// Remove a subtask by its position (1-based).
    Rm { task: String, number: usize },
}

#[derive(Subcommand)]
pub enum SprintAction {
    /// Start a sprint; also turns focus mode on.
    Start {
        #[arg(long, short, default_value_t = 15)]
        minutes: u32,
    },
    /// Stop the running sprint.
    Stop,
    /// Show the countdown until the sprint ends, then stop it.
    Watch,
    /// Show the time left.
    Status,
}

/// Dispatch a parsed command against the store.
pub fn run_command(store: &mut Store, command: Commands) {
    match command {
        Commands::Ui => cmd_ui(store),
        Commands::Add { title, estimate, unit, urgency } => cmd_add(store, title, unit.to_minutes(estimate), urgency),
        Commands::Start { id } => cmd_start(store, id),
        Commands::Done { id, actual } => cmd_done(store, id, actual),
        Commands::Toggle { id } => cmd_toggle(store, id),
        Commands::Status { id, status } => cmd_status(store, id, status),
        Commands::Urgency { id, urgency } => cmd_urgency(store, id, urgency),
        Commands::Sublevel { id, index } => cmd_sublevel(store, id, index),
        Commands::Celebrate { id } => cmd_celebrate(store, id),
        Commands::Subtask { action } => cmd_subtask(store, action),
        Commands::Delete { id } => cmd_delete(store, id),
        Commands::ClearDone => cmd_clear_done(store),
        Commands::Sprint { action } => cmd_sprint(store, action),
        Commands::Focus => cmd_focus(store),
        Commands::Claim => cmd_claim(store),
        Commands::Quote => cmd_quote(store),
        Commands::List { filter } => cmd_list(store.state(), filter),
        Commands::Show { id } => cmd_show(store, id),
        Commands::Stats => cmd_stats(store),
        Commands::Levels => cmd_levels(store.state()),
        Commands::QuickWin => cmd_quick_win(store),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// Resolve a task identifier (ID, ID prefix or title) to a task ID.
/// Returns an error if the identifier is ambiguous or matches nothing.
pub fn resolve_task_identifier(identifier: &str, state: &GameState) -> Result<Uuid, String> {
    let identifier = identifier.trim();
    if let Ok(id) = Uuid::parse_str(identifier) {
        return match state.task(id) {
            Some(_) => Ok(id),
            None => Err(format!("Task with ID {} not found", id)),
        };
    }

    let prefix = identifier.replace('-', "").to_lowercase();
    if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_hexdigit()) {
        let matches: Vec<&Task> = state
            .tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&prefix))
            .collect();
        match matches.len() {
            0 => {}
            1 => return Ok(matches[0].id),
            _ => return Err(ambiguous(identifier, &matches)),
        }
    }

    let matches: Vec<&Task> = state
        .tasks
        .iter()
        .filter(|t| t.title.to_lowercase() == identifier.to_lowercase())
        .collect();
    match matches.len() {
        0 => Err(format!("No task found matching '{}'", identifier)),
        1 => Ok(matches[0].id),
        _ => Err(ambiguous(identifier, &matches)),
    }
}

fn ambiguous(identifier: &str, matches: &[&Task]) -> String {
    let mut msg = format!("Multiple tasks match '{}':\n", identifier);
    for t in matches {
        msg.push_str(&format!("  {}  {} ({})\n", short_id(t), t.title, format_status(t.status)));
    }
    msg.push_str("Please use a longer ID prefix instead.");
    msg
}

fn resolve_or_exit(store: &Store, identifier: &str) -> Uuid {
    match resolve_task_identifier(identifier, store.state()) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error resolving task: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print what a completion unlocked, compared with the state before it.
fn report_rewards(before: &GameState, store: &Store) {
    let after = store.state();
    if after.xp > before.xp {
        println!("+{} XP  (total {})", after.xp - before.xp, after.xp);
    } else if after.xp < before.xp {
        println!("-{} XP  (total {})", before.xp - after.xp, after.xp);
    }
    if after.level_id > before.level_id {
        if let Some(lvl) = level(after.level_id) {
            println!("LEVEL UP! Welcome to {}. {}", lvl.name, lvl.flavor);
            println!("Gift unlocked: {}", lvl.gift);
        }
    }
    if after.streak != before.streak {
        println!("Streak: {}", format_streak(after.streak));
    }
    if after.pending_streak_reward != before.pending_streak_reward {
        if let Some(reward) = after.pending_streak_reward.and_then(streak_reward) {
            println!("{} Streak reward: {} ({}). Run `quest claim` to collect.", reward.emoji, reward.title, reward.note);
        }
    }
}

fn report_milestone(store: &Store) {
    if let Some(task) = store.pending_milestone() {
        println!("All sub-levels of '{}' complete! Run `quest celebrate` to mark it.", task.title);
    }
}

/// Launch the terminal dashboard.
pub fn cmd_ui(store: &mut Store) {
    if let Err(e) = run_tui(store) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

pub fn cmd_add(store: &mut Store, title: String, estimate_min: u32, urgency: i64) {
    let Some(id) = store.add_task(&title, estimate_min, urgency) else {
        eprintln!("Task title cannot be empty");
        std::process::exit(1);
    };
    if let Some(t) = store.task(id) {
        println!(
            "Added {} '{}' (~{}, urgency {}, +{} XP)",
            short_id(t),
            t.title,
            format_minutes(t.estimate_min),
            t.urgency,
            xp_for_task(t.urgency, t.estimate_min)
        );
    }
}

pub fn cmd_start(store: &mut Store, id: String) {
    let task_id = resolve_or_exit(store, &id);
    store.start_task(task_id);
    println!("Started {}", id);
}

pub fn cmd_done(store: &mut Store, id: String, actual: Option<u32>) {
    let task_id = resolve_or_exit(store, &id);
    let before = store.state().clone();
    store.complete_task(task_id, actual);
    if let Some(t) = store.task(task_id) {
        match t.actual_min {
            Some(m) => println!("Completed '{}' in {}", t.title, format_minutes(m)),
            None => println!("Completed '{}'", t.title),
        }
    }
    report_rewards(&before, store);
}

pub fn cmd_toggle(store: &mut Store, id: String) {
    let task_id = resolve_or_exit(store, &id);
    let before = store.state().clone();
    store.toggle_task(task_id);
    if let Some(t) = store.task(task_id) {
        println!("'{}' is now {}", t.title, t.status.label());
    }
    report_rewards(&before, store);
}

pub fn cmd_status(store: &mut Store, id: String, status: Status) {
    let task_id = resolve_or_exit(store, &id);
    let before = store.state().clone();
    store.set_task_status(task_id, status);
    println!("Status set to {}", status.label());
    report_rewards(&before, store);
}

pub fn cmd_urgency(store: &mut Store, id: String, urgency: i64) {
    let task_id = resolve_or_exit(store, &id);
    store.update_urgency(task_id, urgency);
    if let Some(t) = store.task(task_id) {
        println!("Urgency of '{}' is now {}", t.title, t.urgency);
    }
}

pub fn cmd_sublevel(store: &mut Store, id: String, index: u8) {
    let task_id = resolve_or_exit(store, &id);
    store.toggle_sublevel(task_id, usize::from(index) - 1);
    if let Some(t) = store.task(task_id) {
        println!("{}  {}", format_sub_levels(t), t.title);
    }
    report_milestone(store);
}

pub fn cmd_celebrate(store: &mut Store, id: Option<String>) {
    let task_id = match id {
        Some(id) => resolve_or_exit(store, &id),
        None => match store.pending_milestone() {
            Some(t) => t.id,
            None => {
                println!("No milestone waiting to be celebrated.");
                return;
            }
        },
    };
    store.mark_milestone_celebrated(task_id);
    if let Some(t) = store.task(task_id) {
        println!("Milestone reached: '{}'. Keep climbing!", t.title);
    }
}

pub fn cmd_subtask(store: &mut Store, action: SubtaskAction) {
    match action {
        SubtaskAction::Add { task, title } => {
            let task_id = resolve_or_exit(store, &task);
            if title.trim().is_empty() {
                eprintln!("Subtask title cannot be empty");
                std::process::exit(1);
            }
            store.add_subtask(task_id, &title);
            println!("Added subtask '{}'", title.trim());
        }
        SubtaskAction::Toggle { task, number } => {
            let task_id = resolve_or_exit(store, &task);
            let sub_id = subtask_at_or_exit(store, task_id, number);
            store.toggle_subtask(task_id, sub_id);
            println!("Toggled subtask {}", number);
        }
        SubtaskAction::Rm { task, number } => {
            let task_id = resolve_or_exit(store, &task);
            let sub_id = subtask_at_or_exit(store, task_id, number);
            store.remove_subtask(task_id, sub_id);
            println!("Removed subtask {}", number);
        }
    }
}

fn subtask_at_or_exit(store: &Store, task_id: Uuid, number: usize) -> Uuid {
    let found = store
        .task(task_id)
        .and_then(|t| number.checked_sub(1).and_then(|i| t.subtasks.get(i)))
        .map(|s| s.id);
    match found {
        Some(id) => id,
        None => {
            eprintln!("Subtask {} not found.", number);
            std::process::exit(1);
        }
    }
}

pub fn cmd_delete(store: &mut Store, id: String) {
    let task_id = resolve_or_exit(store, &id);
    store.delete_task(task_id);
    println!("Deleted {}", id);
}

pub fn cmd_clear_done(store: &mut Store) {
    let count = store.state().done_tasks().count();
    store.clear_done();
    println!("Cleared {} completed task(s).", count);
}

pub fn cmd_sprint(store: &mut Store, action: SprintAction) {
    match action {
        SprintAction::Start { minutes } => {
            store.start_sprint(minutes);
            println!("Sprint started: {} minutes. Focus mode on.", minutes);
        }
        SprintAction::Stop => {
            store.stop_sprint();
            println!("Sprint stopped.");
        }
        SprintAction::Status => {
            if store.state().sprint_active {
                println!("Sprint: {} left", format_countdown(store.sprint_remaining_ms()));
            } else {
                println!("No sprint running.");
            }
        }
        SprintAction::Watch => cmd_sprint_watch(store),
    }
}

/// Poll the sprint deadline until it passes.
fn cmd_sprint_watch(store: &mut Store) {
    if !store.state().sprint_active {
        println!("No sprint running.");
        return;
    }
    let mut stdout = std::io::stdout();
    loop {
        if store.poll_sprint() {
            println!("\rSprint complete! Race the map.");
            return;
        }
        print!("\rSprint: {} left ", format_countdown(store.sprint_remaining_ms()));
        let _ = stdout.flush();
        thread::sleep(SPRINT_POLL_INTERVAL);
    }
}

pub fn cmd_focus(store: &mut Store) {
    store.toggle_focus_mode();
    println!("Focus mode {}", if store.state().focus_mode { "on" } else { "off" });
}

pub fn cmd_claim(store: &mut Store) {
    let Some(days) = store.state().pending_streak_reward else {
        println!("No streak reward to claim.");
        return;
    };
    store.claim_streak_reward();
    match streak_reward(days) {
        Some(r) => println!("{} Claimed: {} ({})", r.emoji, r.title, r.note),
        None => println!("Claimed the {}-day streak reward.", days),
    }
}

/// Today's quote, stable for the whole day.
pub fn quote_for_today(store: &Store) -> &'static str {
    let ordinal = store.today().num_days_from_ce().unsigned_abs() as usize;
    QUOTES[ordinal % QUOTES.len()]
}

pub fn cmd_quote(store: &mut Store) {
    println!("Daily Boost: {}", quote_for_today(store));
    store.mark_quote_seen_today();
}

pub fn cmd_list(state: &GameState, filter: ListFilter) {
    let tasks: Vec<&Task> = match filter {
        ListFilter::Pending => state.pending_tasks().collect(),
        ListFilter::Done => state.done_tasks().collect(),
        ListFilter::All => state.tasks.iter().collect(),
    };
    if tasks.is_empty() {
        println!("No tasks. Add a quest with `quest add <title>`.");
        return;
    }
    print_table(&tasks);
}

pub fn cmd_show(store: &Store, id: String) {
    let task_id = resolve_or_exit(store, &id);
    let Some(t) = store.task(task_id) else {
        eprintln!("Task {} not found.", id);
        std::process::exit(1);
    };
    println!("ID:          {}", t.id);
    println!("Title:       {}", t.title);
    println!("Status:      {}", format_status(t.status));
    println!("Estimate:    {}", format_minutes(t.estimate_min));
    println!("Urgency:     {}", t.urgency);
    println!("XP value:    +{}", xp_for_task(t.urgency, t.estimate_min));
    println!("Sub-levels:  {} ({}/3)", format_sub_levels(t), t.sub_levels_filled());
    println!("Created:     {}", format_timestamp(Some(t.created_at)));
    println!("Started:     {}", format_timestamp(t.started_at));
    println!("Finished:    {}", format_timestamp(t.finished_at));
    if let Some(m) = t.actual_min {
        println!("Actual:      {}", format_minutes(m));
    }
    if !t.subtasks.is_empty() {
        println!("Subtasks:");
        for (i, s) in t.subtasks.iter().enumerate() {
            println!("  {}. [{}] {}", i + 1, if s.done { "x" } else { " " }, s.title);
        }
    }
}

pub fn cmd_stats(store: &Store) {
    let state = store.state();
    println!("{}", stats_line(state));
    println!(
        "Tasks: {} pending, {} done",
        state.pending_tasks().count(),
        state.done_tasks().count()
    );
    if state.sprint_active {
        println!("Sprint: {} left", format_countdown(store.sprint_remaining_ms()));
    }
    if state.focus_mode {
        println!("Focus mode is on.");
    }
    if let Some(r) = state.pending_streak_reward.and_then(streak_reward) {
        println!("{} Unclaimed streak reward: {}. Run `quest claim`.", r.emoji, r.title);
    }
    report_milestone(store);
    if store.quote_due_today() {
        println!("Daily Boost waiting: run `quest quote`.");
    }
}

pub fn cmd_levels(state: &GameState) {
    let current = level_progress(state.xp).current.id;
    for lvl in LEVELS.iter() {
        let marker = if lvl.id == current {
            ">>"
        } else if lvl.id < current {
            "✓ "
        } else {
            "  "
        };
        println!("{} {} {:<11} {:>5} XP  {}", marker, lvl.id, lvl.name, lvl.goal_xp, lvl.flavor);
    }
}

pub fn cmd_quick_win(store: &Store) {
    match store.quick_win() {
        Some(t) => println!(
            "Quick win: {} '{}' (~{}, +{} XP)",
            short_id(t),
            t.title,
            format_minutes(t.estimate_min),
            xp_for_task(t.urgency, t.estimate_min)
        ),
        None => println!("Nothing pending. Enjoy the view!"),
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStorage;

    fn state_with(titles: &[&str]) -> GameState {
        let mut state = GameState::default();
        for title in titles {
            state.tasks.push(Task::new(*title, 20, 3, 0));
        }
        state
    }

    #[test]
    fn test_resolve_by_full_id_and_prefix() {
        let state = state_with(&["One", "Two"]);
        let id = state.tasks[0].id;
        assert_eq!(resolve_task_identifier(&id.to_string(), &state), Ok(id));
        let prefix = id.simple().to_string()[..12].to_string();
        assert_eq!(resolve_task_identifier(&prefix, &state), Ok(id));
    }

    #[test]
    fn test_resolve_by_title_case_insensitive() {
        let state = state_with(&["Write report", "Stretch"]);
        assert_eq!(resolve_task_identifier("write REPORT", &state), Ok(state.tasks[0].id));
    }

    #[test]
    fn test_resolve_reports_ambiguity_and_misses() {
        let state = state_with(&["Same", "Same"]);
        let err = resolve_task_identifier("same", &state).unwrap_err();
        assert!(err.contains("Multiple tasks"));
        assert!(resolve_task_identifier("nothing here", &state).is_err());
        assert!(resolve_task_identifier(&Uuid::new_v4().to_string(), &state).is_err());
    }

    #[test]
    fn test_quote_is_stable_within_a_day() {
        let store = Store::load(MemoryStorage::new());
        assert_eq!(quote_for_today(&store), quote_for_today(&store));
        assert!(QUOTES.contains(&quote_for_today(&store)));
    }
}
