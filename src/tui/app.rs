//! Main application logic for the terminal dashboard.
//!
//! `App` borrows the store for the lifetime of the session. Every key press
//! maps onto one store operation; the store persists and notifies, and the
//! next frame renders the new snapshot. A store subscription records level
//! changes so the level-up overlay appears whichever operation caused it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use uuid::Uuid;

use crate::cmd::quote_for_today;
use crate::game::{level, level_progress, streak_reward, xp_for_task};
use crate::store::{Store, SubscriptionId};
use crate::task::{clamp_urgency, Task};
use crate::tui::{
    colors::{level_color, BRAND, DARK_RED, FLAME, MUTED},
    enums::{AddField, AppState, ConfirmAction, Modal},
    input::InputField,
    utils::centered_rect,
};
use crate::view::{format_countdown, format_minutes, format_streak, format_sub_levels};

/// Event poll timeout; also the sprint polling cadence.
const TICK: Duration = Duration::from_millis(200);
const SPRINT_MIN: u32 = 5;
const SPRINT_MAX: u32 = 50;
const SPRINT_STEP: u32 = 5;

pub struct App<'a> {
    store: &'a mut Store,
    state: AppState,
    table_state: TableState,
    visible: Vec<Uuid>,
    show_completed: bool,
    title_input: InputField,
    estimate_input: InputField,
    urgency: u8,
    add_field: AddField,
    sprint_minutes: u32,
    status_message: String,
    level_ups: Rc<RefCell<VecDeque<u8>>>,
    subscription: Option<SubscriptionId>,
}

impl<'a> App<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        let level_ups = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&level_ups);
        let mut last_level = store.state().level_id;
        let subscription = store.subscribe(move |state| {
            if state.level_id > last_level {
                sink.borrow_mut().push_back(state.level_id);
            }
            last_level = state.level_id;
        });

        let mut app = App {
            store,
            state: AppState::Dashboard,
            table_state: TableState::default(),
            visible: Vec::new(),
            show_completed: true,
            title_input: InputField::new(),
            estimate_input: InputField::with_value("20"),
            urgency: 3,
            add_field: AddField::Title,
            sprint_minutes: 15,
            status_message: String::new(),
            level_ups,
            subscription: Some(subscription),
        };
        app.refresh_visible();
        app
    }

    /// Drop the store subscription before handing the store back.
    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.store.unsubscribe(id);
        }
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Recompute which tasks the table shows, keeping the selection in range.
    fn refresh_visible(&mut self) {
        let state = self.store.state();
        let hide_done = state.focus_mode || !self.show_completed;
        self.visible = state
            .tasks
            .iter()
            .filter(|t| !(hide_done && t.is_done()))
            .map(|t| t.id)
            .collect();

        match self.table_state.selected() {
            _ if self.visible.is_empty() => self.table_state.select(None),
            Some(i) if i >= self.visible.len() => self.table_state.select(Some(self.visible.len() - 1)),
            None => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    fn selected_id(&self) -> Option<Uuid> {
        self.table_state.selected().and_then(|i| self.visible.get(i).copied())
    }

    fn select_id(&mut self, id: Uuid) {
        if let Some(i) = self.visible.iter().position(|&v| v == id) {
            self.table_state.select(Some(i));
        }
    }

    /// Open the next celebration, if any is waiting and nothing else has focus.
    fn offer_modal(&mut self) {
        if self.state != AppState::Dashboard {
            return;
        }
        let next = if let Some(id) = self.level_ups.borrow_mut().pop_front() {
            Some(Modal::LevelUp(id))
        } else if let Some(task) = self.store.pending_milestone() {
            Some(Modal::Milestone(task.id))
        } else if let Some(days) = self.store.state().pending_streak_reward {
            Some(Modal::StreakReward(days))
        } else if self.store.quote_due_today() {
            Some(Modal::DailyQuote)
        } else {
            None
        };
        if let Some(modal) = next {
            self.state = AppState::Modal(modal);
        }
    }

    // --- input ------------------------------------------------------------

    fn handle_dashboard_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        let selected = self.selected_id();
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(i) = self.table_state.selected() {
                    self.table_state.select(Some(i.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(i) = self.table_state.selected() {
                    if i + 1 < self.visible.len() {
                        self.table_state.select(Some(i + 1));
                    }
                }
            }
            KeyCode::Char('a') => {
                if self.store.state().focus_mode {
                    self.set_status_message("Focus mode hides new quests. Press 'f' to exit focus mode.");
                } else {
                    self.title_input.clear();
                    self.add_field = AddField::Title;
                    self.state = AppState::AddTask;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(id) = selected {
                    let before = self.store.state().xp;
                    self.store.toggle_task(id);
                    let after = self.store.state().xp;
                    if after > before {
                        self.set_status_message(format!("+{} XP", after - before));
                    } else if after < before {
                        self.set_status_message(format!("-{} XP", before - after));
                    }
                }
            }
            KeyCode::Char('s') => {
                if let Some(id) = selected {
                    self.store.start_task(id);
                    self.set_status_message("Quest started");
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = selected {
                    self.state = AppState::Confirm(ConfirmAction::Delete(id));
                }
            }
            KeyCode::Char('c') => self.state = AppState::Confirm(ConfirmAction::ClearDone),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char('-') => {
                if let Some(task) = selected.and_then(|id| self.store.task(id)) {
                    let delta = if key == KeyCode::Char('-') { -1 } else { 1 };
                    let (id, urgency) = (task.id, i64::from(task.urgency) + delta);
                    self.store.update_urgency(id, urgency);
                }
            }
            KeyCode::Char(c @ '1'..='3') => {
                if let Some(id) = selected {
                    let index = c as usize - '1' as usize;
                    self.store.toggle_sublevel(id, index);
                }
            }
            KeyCode::Char('f') => {
                self.store.toggle_focus_mode();
            }
            KeyCode::Char('p') => {
                self.store.start_sprint(self.sprint_minutes);
                self.set_status_message(format!("Sprint started: {} minutes", self.sprint_minutes));
            }
            KeyCode::Char('x') => {
                if self.store.state().sprint_active {
                    self.store.stop_sprint();
                    self.set_status_message("Sprint stopped");
                }
            }
            KeyCode::Char('[') => {
                self.sprint_minutes = self.sprint_minutes.saturating_sub(SPRINT_STEP).max(SPRINT_MIN);
            }
            KeyCode::Char(']') => {
                self.sprint_minutes = (self.sprint_minutes + SPRINT_STEP).min(SPRINT_MAX);
            }
            KeyCode::Char('w') => match self.store.quick_win().map(|t| (t.id, t.title.clone())) {
                Some((id, title)) => {
                    self.select_id(id);
                    self.set_status_message(format!("Quick win: {}", title));
                }
                None => self.set_status_message("Nothing pending"),
            },
            KeyCode::Char('v') => self.show_completed = !self.show_completed,
            KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
            _ => {}
        }
        false
    }

    fn handle_add_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.state = AppState::Dashboard,
            KeyCode::Tab | KeyCode::Down => self.add_field = self.add_field.next(),
            KeyCode::Enter => self.submit_task(),
            KeyCode::Left => match self.add_field {
                AddField::Title => self.title_input.move_cursor_left(),
                AddField::Estimate => self.estimate_input.move_cursor_left(),
                AddField::Urgency => self.urgency = clamp_urgency(i64::from(self.urgency) - 1),
            },
            KeyCode::Right => match self.add_field {
                AddField::Title => self.title_input.move_cursor_right(),
                AddField::Estimate => self.estimate_input.move_cursor_right(),
                AddField::Urgency => self.urgency = clamp_urgency(i64::from(self.urgency) + 1),
            },
            KeyCode::Backspace => match self.add_field {
                AddField::Title => self.title_input.handle_backspace(),
                AddField::Estimate => self.estimate_input.handle_backspace(),
                AddField::Urgency => {}
            },
            KeyCode::Char(c) => match self.add_field {
                AddField::Title => self.title_input.handle_char(c),
                AddField::Estimate if c.is_ascii_digit() => self.estimate_input.handle_char(c),
                AddField::Urgency => {
                    if let Some(d) = c.to_digit(10) {
                        self.urgency = clamp_urgency(i64::from(d));
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn submit_task(&mut self) {
        let title = self.title_input.value.trim().to_string();
        let estimate = self.estimate_input.value.parse::<u32>().unwrap_or(0);
        let Some(id) = self.store.add_task(&title, estimate, i64::from(self.urgency)) else {
            self.set_status_message("A quest needs a title");
            return;
        };
        self.state = AppState::Dashboard;
        self.refresh_visible();
        self.select_id(id);
        self.set_status_message(format!("Added '{}'", title));
    }

    fn handle_confirm_input(&mut self, key: KeyCode, action: ConfirmAction) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                match action {
                    ConfirmAction::Delete(id) => {
                        self.store.delete_task(id);
                        self.set_status_message("Quest deleted");
                    }
                    ConfirmAction::ClearDone => {
                        self.store.clear_done();
                        self.set_status_message("Completed quests cleared");
                    }
                }
                self.state = AppState::Dashboard;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.state = AppState::Dashboard,
            _ => {}
        }
    }

    fn handle_modal_input(&mut self, key: KeyCode, modal: Modal) {
        if !matches!(key, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            return;
        }
        match modal {
            Modal::LevelUp(_) => {}
            Modal::Milestone(id) => {
                self.store.mark_milestone_celebrated(id);
            }
            Modal::StreakReward(_) => {
                self.store.claim_streak_reward();
            }
            Modal::DailyQuote => {
                self.store.mark_quote_seen_today();
            }
        }
        self.state = AppState::Dashboard;
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(false);
                }
                self.status_message.clear();
                match self.state {
                    AppState::Dashboard => {
                        if self.handle_dashboard_input(key.code, key.modifiers) {
                            return Ok(true);
                        }
                    }
                    AppState::AddTask => self.handle_add_input(key.code),
                    AppState::Help => self.state = AppState::Dashboard,
                    AppState::Confirm(action) => self.handle_confirm_input(key.code, action),
                    AppState::Modal(modal) => self.handle_modal_input(key.code, modal),
                }
            }
        }
        Ok(false)
    }

    // --- rendering --------------------------------------------------------

    fn render_stats_bar(&mut self, f: &mut Frame, area: Rect) {
        let state = self.store.state();
        let progress = level_progress(state.xp);
        let color = level_color(progress.current.id);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(24), Constraint::Min(20), Constraint::Length(20)])
            .split(area);

        let level_text = Paragraph::new(vec![
            Line::from(Span::styled("Level", Style::default().fg(MUTED))),
            Line::from(Span::styled(
                format!("{} {}", progress.current.id, progress.current.name),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
        ])
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(level_text, chunks[0]);

        let label = match progress.next {
            Some(next) => format!("{} / {} XP", state.xp, next.goal_xp),
            None => format!("{} XP - Max level!", state.xp),
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("XP to next"))
            .gauge_style(Style::default().fg(BRAND).bg(Color::Rgb(30, 30, 45)))
            .ratio(progress.fraction)
            .label(label);
        f.render_widget(gauge, chunks[1]);

        let streak = Paragraph::new(vec![
            Line::from(Span::styled("Streak", Style::default().fg(MUTED))),
            Line::from(Span::styled(
                format_streak(state.streak),
                Style::default().fg(FLAME).add_modifier(Modifier::BOLD),
            )),
        ])
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(streak, chunks[2]);
    }

    fn render_task_table(&mut self, f: &mut Frame, area: Rect) {
        let state = self.store.state();
        let header = Row::new(["", "Status", "Quest", "Est", "Urg", "XP", "Sub"].iter().map(|h| {
            Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(BRAND).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = self
            .visible
            .iter()
            .filter_map(|&id| state.task(id))
            .map(|task: &Task| {
                let style = if task.is_done() {
                    Style::default().fg(MUTED).add_modifier(Modifier::CROSSED_OUT)
                } else if task.status == crate::fields::Status::Progress {
                    Style::default().fg(BRAND).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                let check = if task.is_done() { "✔" } else { "○" };
                let subtasks = if task.subtasks.is_empty() {
                    String::new()
                } else {
                    let done = task.subtasks.iter().filter(|s| s.done).count();
                    format!(" ({}/{})", done, task.subtasks.len())
                };
                Row::new(vec![
                    Cell::from(check),
                    Cell::from(task.status.label()),
                    Cell::from(format!("{}{}", task.title, subtasks)),
                    Cell::from(format!("~{}", format_minutes(task.estimate_min))),
                    Cell::from(task.urgency.to_string()),
                    Cell::from(format!("+{}", xp_for_task(task.urgency, task.estimate_min))),
                    Cell::from(format_sub_levels(task)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(2),
            Constraint::Length(9),
            Constraint::Min(20),
            Constraint::Length(7),
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(4),
        ];
        let title = if state.focus_mode {
            format!("Focus Mode ({} pending)", self.visible.len())
        } else {
            format!("Your Checklist ({} pending, {} done)", state.pending_tasks().count(), state.done_tasks().count())
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_sidebar(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(area);

        let state = self.store.state();
        let sprint_lines = if state.sprint_active {
            vec![
                Line::from(Span::styled(
                    format_countdown(self.store.sprint_remaining_ms()),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from("'x' stop  'f' focus"),
            ]
        } else {
            vec![
                Line::from(format!("Length: {}m  ('[' / ']')", self.sprint_minutes)),
                Line::from("'p' start sprint"),
            ]
        };
        let sprint = Paragraph::new(sprint_lines)
            .block(Block::default().borders(Borders::ALL).title("Sprint - Race the map"))
            .alignment(Alignment::Center);
        f.render_widget(sprint, chunks[0]);

        let how = Paragraph::new(vec![
            Line::from("Complete tasks to earn XP and fill the path to the next level."),
            Line::from(""),
            Line::from("Use Focus Mode sprints to channel urgency if you procrastinate actively."),
            Line::from(""),
            Line::from(Span::styled(quote_for_today(self.store), Style::default().fg(MUTED).add_modifier(Modifier::ITALIC))),
        ])
        .block(Block::default().borders(Borders::ALL).title("How it works"))
        .wrap(Wrap { trim: true });
        f.render_widget(how, chunks[1]);
    }

    fn render_add_form(&mut self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 40, area);
        f.render_widget(Clear, area);

        let field_style = |field: AddField| {
            if self.add_field == field {
                Style::default().fg(Color::Black).bg(BRAND)
            } else {
                Style::default()
            }
        };
        let estimate = self.estimate_input.value.parse::<u32>().unwrap_or(0);
        let preview = xp_for_task(self.urgency, estimate);
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::raw("Quest:    "), Span::styled(format!("{}_", self.title_input.value), field_style(AddField::Title))]),
            Line::from(vec![Span::raw("Estimate: "), Span::styled(format!("{} min", self.estimate_input.value), field_style(AddField::Estimate))]),
            Line::from(vec![Span::raw("Urgency:  "), Span::styled(format!("< {} >", self.urgency), field_style(AddField::Urgency))]),
            Line::from(""),
            Line::from(format!("Worth +{} XP", preview)),
            Line::from(""),
            Line::from("Tab next field · Enter add · Esc cancel"),
        ];
        let form = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Add a quest"))
            .wrap(Wrap { trim: false });
        f.render_widget(form, area);
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let area = centered_rect(60, 70, area);
        f.render_widget(Clear, area);
        let keys = [
            ("a", "add quest"),
            ("space/enter", "complete / undo"),
            ("s", "start quest"),
            ("+ / -", "urgency up / down"),
            ("1 2 3", "toggle sub-levels"),
            ("d", "delete quest"),
            ("c", "clear completed"),
            ("w", "quick win"),
            ("v", "show / hide completed"),
            ("f", "focus mode"),
            ("p / x", "start / stop sprint"),
            ("[ / ]", "sprint length"),
            ("q", "quit"),
        ];
        let lines: Vec<Line> = keys
            .iter()
            .map(|(k, d)| Line::from(vec![Span::styled(format!("{:>12}  ", k), Style::default().fg(BRAND)), Span::raw(*d)]))
            .collect();
        let help = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help (any key to close)"));
        f.render_widget(help, area);
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect, action: ConfirmAction) {
        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);
        let what = match action {
            ConfirmAction::Delete(id) => format!(
                "Delete '{}'?",
                self.store.task(id).map(|t| t.title.as_str()).unwrap_or("?")
            ),
            ConfirmAction::ClearDone => "Clear all completed quests?".to_string(),
        };
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(what, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(Block::default().title("Confirm Action").borders(Borders::ALL).style(Style::default().bg(DARK_RED)))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_modal(&mut self, f: &mut Frame, area: Rect, modal: Modal) {
        let (title, lines, button) = match modal {
            Modal::LevelUp(id) => {
                let lvl = level(id);
                (
                    "Level Up!".to_string(),
                    vec![
                        format!("Welcome to {}.", lvl.map(|l| l.name).unwrap_or("a new level")),
                        lvl.map(|l| l.flavor).unwrap_or_default().to_string(),
                        String::new(),
                        format!("Gift unlocked: {}", lvl.map(|l| l.gift).unwrap_or("a surprise")),
                    ],
                    "Claim and continue",
                )
            }
            Modal::Milestone(id) => (
                "Milestone!".to_string(),
                vec![
                    "All three sub-levels complete:".to_string(),
                    self.store.task(id).map(|t| t.title.clone()).unwrap_or_default(),
                ],
                "Keep climbing",
            ),
            Modal::StreakReward(days) => {
                let reward = streak_reward(days);
                (
                    format!("{} Streak Reward!", reward.map(|r| r.emoji).unwrap_or("")),
                    vec![
                        reward.map(|r| r.title).unwrap_or("Streak reward").to_string(),
                        reward.map(|r| r.note).unwrap_or_default().to_string(),
                        format!("{} days in a row", days),
                    ],
                    "Claim",
                )
            }
            Modal::DailyQuote => (
                "Daily Boost".to_string(),
                vec![quote_for_today(self.store).to_string()],
                "Let's go",
            ),
        };

        let area = centered_rect(50, 40, area);
        f.render_widget(Clear, area);
        let mut text: Vec<Line> = vec![Line::from("")];
        text.extend(lines.into_iter().map(Line::from));
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(format!("[ {} ]", button), Style::default().fg(BRAND).add_modifier(Modifier::BOLD))));
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::Dashboard => "Press 'h' for help".to_string(),
                AppState::AddTask => "Add New Quest".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm(_) => "Confirm Action".to_string(),
                AppState::Modal(_) => "Enter to continue".to_string(),
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(BRAND).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
            .split(chunks[1]);

        self.render_stats_bar(f, chunks[0]);
        self.render_task_table(f, body[0]);
        self.render_sidebar(f, body[1]);

        match self.state {
            AppState::Dashboard => {}
            AppState::AddTask => self.render_add_form(f, chunks[1]),
            AppState::Help => self.render_help(f, chunks[1]),
            AppState::Confirm(action) => self.render_confirm(f, chunks[1], action),
            AppState::Modal(modal) => self.render_modal(f, chunks[1], modal),
        }

        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop: poll the sprint, offer celebrations, draw, handle keys.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            if self.store.poll_sprint() {
                self.set_status_message("Sprint complete! Race the map.");
            }
            self.refresh_visible();
            self.offer_modal();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
