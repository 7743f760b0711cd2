//! The state container behind every command and the dashboard.
//!
//! `Store` owns the `GameState`, applies operations to it, recomputes the
//! cached level, writes the result through to its `Storage` backend and then
//! notifies subscribers with the new snapshot. All operations run to
//! completion before returning; callers on other threads must funnel their
//! calls through whichever thread owns the store.
//!
//! Unknown ids and out-of-range inputs never produce errors: the former are
//! ignored, the latter clamped.

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{day_key, parse_day_key, Clock, SystemClock};
use crate::db::{encode, load_state, GameState, Storage};
use crate::fields::Status;
use crate::game::{is_streak_milestone, level_for_xp, xp_for_task};
use crate::task::{clamp_urgency, Subtask, Task, SUBLEVEL_COUNT};

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&GameState)>;

pub struct Store {
    state: GameState,
    storage: Box<dyn Storage>,
    clock: Box<dyn Clock>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Store {
    /// Load from `storage` using the system clock.
    pub fn load(storage: impl Storage + 'static) -> Self {
        Self::with_clock(storage, SystemClock)
    }

    pub fn with_clock(mut storage: impl Storage + 'static, clock: impl Clock + 'static) -> Self {
        let state = load_state(&mut storage);
        Store {
            state,
            storage: Box::new(storage),
            clock: Box::new(clock),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.state.task(id)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(sid, _)| *sid != id);
    }

    /// Recompute derived fields, persist, notify. Persistence is best effort.
    fn commit(&mut self) -> &GameState {
        self.state.level_id = level_for_xp(self.state.xp);
        match encode(&self.state) {
            Ok(blob) => {
                if let Err(e) = self.storage.write(&blob) {
                    warn!("Failed to save state: {e}");
                }
            }
            Err(e) => warn!("Failed to encode state: {e}"),
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state);
        }
        &self.state
    }

    fn unknown(&self, op: &str, id: Uuid) -> &GameState {
        debug!(%id, "{op}: no such task");
        &self.state
    }

    // --- task lifecycle -------------------------------------------------

    /// Append a new `todo` task and return its id. A blank title adds nothing.
    pub fn add_task(&mut self, title: &str, estimate_min: u32, urgency: i64) -> Option<Uuid> {
        let title = title.trim();
        if title.is_empty() {
            debug!("add_task: blank title ignored");
            return None;
        }
        let task = Task::new(title, estimate_min, urgency, self.clock.now_ms());
        let id = task.id;
        debug!(%id, estimate = task.estimate_min, urgency = task.urgency, "add task");
        self.state.tasks.push(task);
        self.commit();
        Some(id)
    }

    /// Move a task to `progress` and stamp `started_at`. Restarting a done
    /// task reopens it, refunding its XP.
    pub fn start_task(&mut self, id: Uuid) -> &GameState {
        let now = self.clock.now_ms();
        if !self.apply_status(id, Status::Progress) {
            return self.unknown("start_task", id);
        }
        if let Some(task) = self.state.task_mut(id) {
            task.started_at = Some(now);
        }
        self.commit()
    }

    /// Move a task to `status`, granting or refunding XP on transitions into
    /// or out of `done`.
    pub fn set_task_status(&mut self, id: Uuid, status: Status) -> &GameState {
        if !self.apply_status(id, status) {
            return self.unknown("set_task_status", id);
        }
        self.commit()
    }

    /// Mark a task done, recording how long it actually took. Without an
    /// explicit duration the time since `started_at` is used, if known.
    pub fn complete_task(&mut self, id: Uuid, actual_min: Option<u32>) -> &GameState {
        let now = self.clock.now_ms();
        let Some(started_at) = self.state.task(id).map(|t| t.started_at) else {
            return self.unknown("complete_task", id);
        };
        let actual = actual_min.or_else(|| {
            started_at.map(|start| ((now - start).max(0) as f64 / 60_000.0).round() as u32)
        });
        self.apply_status(id, Status::Done);
        if let Some(task) = self.state.task_mut(id) {
            task.finished_at = Some(now);
            task.actual_min = actual;
        }
        self.commit()
    }

    /// Flip between `done` and `todo`.
    pub fn toggle_task(&mut self, id: Uuid) -> &GameState {
        let Some(done) = self.state.task(id).map(Task::is_done) else {
            return self.unknown("toggle_task", id);
        };
        let next = if done { Status::Todo } else { Status::Done };
        self.set_task_status(id, next)
    }

    /// Core transition. Returns `false` if the task does not exist.
    fn apply_status(&mut self, id: Uuid, status: Status) -> bool {
        let now = self.clock.now_ms();
        let Some(task) = self.state.task_mut(id) else {
            return false;
        };
        let was_done = task.is_done();
        let will_be_done = status == Status::Done;
        // Refunds use the task's current urgency/estimate, not what was granted.
        let reward = xp_for_task(task.urgency, task.estimate_min);

        task.set_status(status);
        if will_be_done && !was_done {
            task.finished_at = Some(now);
        } else if was_done && !will_be_done {
            task.finished_at = None;
            task.actual_min = None;
        }

        if will_be_done && !was_done {
            self.state.xp = self.state.xp.saturating_add(reward);
            self.advance_streak();
            debug!(%id, reward, xp = self.state.xp, streak = self.state.streak, "task completed");
        } else if was_done && !will_be_done {
            self.state.xp = self.state.xp.saturating_sub(reward);
            debug!(%id, reward, xp = self.state.xp, "task reopened");
        }
        true
    }

    /// Streak bookkeeping for a completing transition.
    fn advance_streak(&mut self) {
        let today = self.clock.today();
        let key = day_key(today);
        let state = &mut self.state;

        if state.last_complete_day.as_deref() == Some(key.as_str()) {
            state.streak = state.streak.max(1);
        } else {
            let yesterday = today - Duration::days(1);
            let continued = state
                .last_complete_day
                .as_deref()
                .and_then(parse_day_key)
                .is_some_and(|last| last == yesterday);
            state.streak = if continued { state.streak.max(1) + 1 } else { 1 };
            state.last_complete_day = Some(key);
        }

        let streak = state.streak;
        if is_streak_milestone(streak) && !state.streak_rewards_claimed.contains(&streak) {
            info!(streak, "streak milestone reached");
            state.pending_streak_reward = Some(streak);
        }
    }

    /// Change urgency. XP already earned for a done task is left alone.
    pub fn update_urgency(&mut self, id: Uuid, urgency: i64) -> &GameState {
        let Some(task) = self.state.task_mut(id) else {
            return self.unknown("update_urgency", id);
        };
        task.urgency = clamp_urgency(urgency);
        self.commit()
    }

    // --- sub-levels and milestones ----------------------------------------

    /// Flip sub-level `index` (0-based). Indices past the third are ignored.
    pub fn toggle_sublevel(&mut self, id: Uuid, index: usize) -> &GameState {
        if index >= SUBLEVEL_COUNT {
            debug!(%id, index, "toggle_sublevel: index out of range");
            return &self.state;
        }
        let Some(task) = self.state.task_mut(id) else {
            return self.unknown("toggle_sublevel", id);
        };
        task.sub_levels[index] = !task.sub_levels[index];
        self.commit()
    }

    /// First task whose sub-levels are all filled and not yet celebrated.
    pub fn pending_milestone(&self) -> Option<&Task> {
        self.state
            .tasks
            .iter()
            .find(|t| t.sub_levels_complete() && !self.state.celebrated_milestones.contains(&t.id))
    }

    /// Record that a task's milestone has been shown. Never un-set.
    pub fn mark_milestone_celebrated(&mut self, id: Uuid) -> &GameState {
        if self.state.task(id).is_none() {
            return self.unknown("mark_milestone_celebrated", id);
        }
        self.state.celebrated_milestones.insert(id);
        self.commit()
    }

    // --- subtasks ---------------------------------------------------------

    pub fn add_subtask(&mut self, task_id: Uuid, title: &str) -> Option<Uuid> {
        let Some(task) = self.state.task_mut(task_id) else {
            self.unknown("add_subtask", task_id);
            return None;
        };
        let id = Uuid::new_v4();
        task.subtasks.push(Subtask { id, title: title.trim().to_string(), done: false });
        self.commit();
        Some(id)
    }

    pub fn toggle_subtask(&mut self, task_id: Uuid, subtask_id: Uuid) -> &GameState {
        let Some(sub) = self.state.task_mut(task_id).and_then(|t| t.subtask_mut(subtask_id)) else {
            return self.unknown("toggle_subtask", subtask_id);
        };
        sub.done = !sub.done;
        self.commit()
    }

    pub fn remove_subtask(&mut self, task_id: Uuid, subtask_id: Uuid) -> &GameState {
        let Some(task) = self.state.task_mut(task_id) else {
            return self.unknown("remove_subtask", task_id);
        };
        let before = task.subtasks.len();
        task.subtasks.retain(|s| s.id != subtask_id);
        if task.subtasks.len() == before {
            return self.unknown("remove_subtask", subtask_id);
        }
        self.commit()
    }

    // --- removal ----------------------------------------------------------

    pub fn delete_task(&mut self, id: Uuid) -> &GameState {
        let before = self.state.tasks.len();
        self.state.tasks.retain(|t| t.id != id);
        if self.state.tasks.len() == before {
            return self.unknown("delete_task", id);
        }
        self.commit()
    }

    /// Drop every done task, keeping the rest in order. No XP changes.
    pub fn clear_done(&mut self) -> &GameState {
        self.state.tasks.retain(|t| !t.is_done());
        self.commit()
    }

    // --- sprint and focus -------------------------------------------------

    /// Start a focus sprint ending `minutes` from now. Forces focus mode on.
    pub fn start_sprint(&mut self, minutes: u32) -> &GameState {
        let now = self.clock.now_ms();
        self.state.sprint_active = true;
        self.state.sprint_ends_at = Some(now + i64::from(minutes) * 60_000);
        self.state.focus_mode = true;
        info!(minutes, "sprint started");
        self.commit()
    }

    /// Clear the sprint. Focus mode is left as it is.
    pub fn stop_sprint(&mut self) -> &GameState {
        self.state.sprint_active = false;
        self.state.sprint_ends_at = None;
        self.commit()
    }

    /// Milliseconds left in the running sprint, 0 when idle or overdue.
    pub fn sprint_remaining_ms(&self) -> i64 {
        match (self.state.sprint_active, self.state.sprint_ends_at) {
            (true, Some(ends_at)) => (ends_at - self.clock.now_ms()).max(0),
            _ => 0,
        }
    }

    /// Stop the sprint if its deadline has passed. Safe to call on every tick.
    pub fn poll_sprint(&mut self) -> bool {
        let expired = match (self.state.sprint_active, self.state.sprint_ends_at) {
            (true, Some(ends_at)) => self.clock.now_ms() >= ends_at,
            (true, None) => true,
            _ => false,
        };
        if expired {
            info!("sprint finished");
            self.stop_sprint();
        }
        expired
    }

    pub fn toggle_focus_mode(&mut self) -> &GameState {
        self.state.focus_mode = !self.state.focus_mode;
        self.commit()
    }

    // --- rewards and daily prompt -----------------------------------------

    /// Move the pending streak reward into the claimed set.
    pub fn claim_streak_reward(&mut self) -> &GameState {
        let Some(days) = self.state.pending_streak_reward.take() else {
            return &self.state;
        };
        self.state.streak_rewards_claimed.insert(days);
        self.commit()
    }

    pub fn mark_quote_seen_today(&mut self) -> &GameState {
        self.state.quote_seen_day = Some(day_key(self.clock.today()));
        self.commit()
    }

    /// True until today's quote has been acknowledged.
    pub fn quote_due_today(&self) -> bool {
        self.state.quote_seen_day.as_deref() != Some(day_key(self.clock.today()).as_str())
    }

    /// The pending task that looks quickest to knock out.
    pub fn quick_win(&self) -> Option<&Task> {
        self.state
            .pending_tasks()
            .min_by_key(|t| t.estimate_min + u32::from(t.urgency))
    }

    /// Local calendar day according to the store's clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::db::{decode, MemoryStorage};

    fn store() -> (Store, ManualClock, MemoryStorage) {
        let clock = ManualClock::at(2026, 6, 10);
        let storage = MemoryStorage::new();
        let store = Store::with_clock(storage.clone(), clock.clone());
        (store, clock, storage)
    }

    #[test]
    fn test_add_task_appends_clamped_todo() {
        let (mut s, _, _) = store();
        let first = s.add_task("Write report", 30, 4).unwrap();
        let second = s.add_task("Tiny", 1, 0).unwrap();

        let ids: Vec<Uuid> = s.state().tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first, second]);

        let t = s.task(first).unwrap();
        assert_eq!((t.estimate_min, t.urgency, t.status), (30, 4, Status::Todo));
        let t = s.task(second).unwrap();
        assert_eq!((t.estimate_min, t.urgency), (5, 1));
    }

    #[test]
    fn test_complete_task_grants_xp_and_keeps_level() {
        let (mut s, _, _) = store();
        let id = s.add_task("Write report", 30, 4).unwrap();
        s.complete_task(id, None);
        assert_eq!(s.state().xp, 41);
        assert_eq!(s.state().level_id, 1);
        let t = s.task(id).unwrap();
        assert_eq!(t.status, Status::Done);
        assert!(t.done);
        assert!(t.finished_at.is_some());
        assert_eq!(t.actual_min, None);
    }

    #[test]
    fn test_complete_task_measures_elapsed_time() {
        let (mut s, clock, _) = store();
        let id = s.add_task("Deep work", 60, 3).unwrap();
        s.start_task(id);
        assert_eq!(s.task(id).unwrap().status, Status::Progress);
        clock.advance(Duration::minutes(47));
        s.complete_task(id, None);
        assert_eq!(s.task(id).unwrap().actual_min, Some(47));

        let other = s.add_task("Admin", 10, 3).unwrap();
        s.complete_task(other, Some(12));
        assert_eq!(s.task(other).unwrap().actual_min, Some(12));
    }

    #[test]
    fn test_restarting_a_done_task_refunds_its_xp() {
        let (mut s, _, _) = store();
        let id = s.add_task("a", 30, 4).unwrap();
        s.complete_task(id, None);
        s.start_task(id);
        let t = s.task(id).unwrap();
        assert_eq!(t.status, Status::Progress);
        assert!(t.started_at.is_some() && t.finished_at.is_none());
        assert_eq!(s.state().xp, 0);

        s.complete_task(id, None);
        assert_eq!(s.state().xp, xp_for_task(4, 30));
    }

    #[test]
    fn test_blank_title_adds_nothing() {
        let (mut s, _, storage) = store();
        assert_eq!(s.add_task("   ", 30, 3), None);
        assert!(s.state().tasks.is_empty());
        assert!(storage.contents().is_none());
    }

    #[test]
    fn test_legacy_blob_survives_the_next_write() {
        let blob = r#"{ "version": 0, "state": { "tasks": [{
            "id": "6f1c2f4e-8a47-4f59-9d43-1d7f5b0b8c11", "title": "Quick call",
            "estimateMin": 7.5, "urgency": 3, "createdAt": 0 }],
            "xp": 420, "streak": 5 } }"#;
        let storage = MemoryStorage::with_blob(blob);
        let mut s = Store::with_clock(storage.clone(), ManualClock::at(2026, 6, 10));
        s.toggle_focus_mode();

        let saved = decode(&storage.contents().unwrap()).unwrap();
        assert_eq!((saved.xp, saved.streak, saved.tasks.len()), (420, 5, 1));
        assert_eq!(saved.level_id, 2);
    }

    #[test]
    fn test_undo_restores_xp() {
        let (mut s, _, _) = store();
        let id = s.add_task("Laundry", 20, 2).unwrap();
        s.toggle_task(id);
        assert!(s.state().xp > 0);
        s.toggle_task(id);
        assert_eq!(s.state().xp, 0);
        let t = s.task(id).unwrap();
        assert_eq!(t.status, Status::Todo);
        assert!(t.finished_at.is_none());
    }

    #[test]
    fn test_refund_uses_current_urgency() {
        let (mut s, _, _) = store();
        let keep = s.add_task("Keep", 30, 5).unwrap();
        s.toggle_task(keep);
        let id = s.add_task("Edit me", 30, 1).unwrap();
        s.toggle_task(id);
        let before = s.state().xp;
        assert_eq!(before, xp_for_task(5, 30) + xp_for_task(1, 30));

        s.update_urgency(id, 5);
        assert_eq!(s.state().xp, before);
        s.toggle_task(id);
        assert_eq!(s.state().xp, before - xp_for_task(5, 30));
    }

    #[test]
    fn test_xp_floors_at_zero() {
        let (mut s, _, _) = store();
        let id = s.add_task("Cheap", 5, 1).unwrap();
        s.toggle_task(id);
        s.update_urgency(id, 5);
        s.toggle_task(id);
        assert_eq!(s.state().xp, 0);
    }

    #[test]
    fn test_level_recomputed_on_every_change() {
        let (mut s, _, _) = store();
        let ids: Vec<Uuid> = (0..7).map(|i| s.add_task(&format!("q{i}"), 60, 5).unwrap()).collect();
        for &id in &ids {
            s.toggle_task(id);
        }
        // 7 × 47 = 329
        assert_eq!(s.state().xp, 329);
        assert_eq!(s.state().level_id, 2);
        s.toggle_task(ids[0]);
        s.toggle_task(ids[1]);
        assert_eq!(s.state().xp, 235);
        assert_eq!(s.state().level_id, 1);
    }

    #[test]
    fn test_status_transitions_between_non_done_states_leave_xp() {
        let (mut s, _, _) = store();
        let id = s.add_task("Pause me", 20, 3).unwrap();
        s.set_task_status(id, Status::Progress);
        s.set_task_status(id, Status::Todo);
        assert_eq!(s.state().xp, 0);
        s.set_task_status(id, Status::Done);
        let xp = s.state().xp;
        s.set_task_status(id, Status::Done);
        assert_eq!(s.state().xp, xp);
        s.set_task_status(id, Status::Progress);
        assert_eq!(s.state().xp, 0);
    }

    #[test]
    fn test_same_day_completions_do_not_inflate_streak() {
        let (mut s, _, _) = store();
        let a = s.add_task("a", 10, 3).unwrap();
        let b = s.add_task("b", 10, 3).unwrap();
        s.toggle_task(a);
        s.toggle_task(b);
        assert_eq!(s.state().streak, 1);
        assert_eq!(s.state().last_complete_day.as_deref(), Some("2026-6-10"));
        // Both completions still earn XP.
        assert_eq!(s.state().xp, 2 * xp_for_task(3, 10));
    }

    #[test]
    fn test_consecutive_days_grow_streak_and_gap_resets() {
        let (mut s, clock, _) = store();
        for expected in 1..=4 {
            let id = s.add_task("daily", 10, 3).unwrap();
            s.toggle_task(id);
            assert_eq!(s.state().streak, expected);
            clock.advance_days(1);
        }
        clock.advance_days(1);
        let id = s.add_task("after a gap", 10, 3).unwrap();
        s.toggle_task(id);
        assert_eq!(s.state().streak, 1);
    }

    #[test]
    fn test_undo_does_not_touch_streak() {
        let (mut s, clock, _) = store();
        let id = s.add_task("a", 10, 3).unwrap();
        s.toggle_task(id);
        clock.advance_days(1);
        s.toggle_task(id);
        assert_eq!(s.state().streak, 1);
        assert_eq!(s.state().last_complete_day.as_deref(), Some("2026-6-10"));
    }

    #[test]
    fn test_streak_reward_fires_once_per_threshold() {
        let (mut s, clock, _) = store();
        let complete_on_days = |s: &mut Store, days: u32| {
            for _ in 0..days {
                let id = s.add_task("daily", 10, 3).unwrap();
                s.toggle_task(id);
                clock.advance_days(1);
            }
        };

        complete_on_days(&mut s, 3);
        assert_eq!(s.state().streak, 3);
        assert_eq!(s.state().pending_streak_reward, Some(3));

        s.claim_streak_reward();
        assert_eq!(s.state().pending_streak_reward, None);
        assert!(s.state().streak_rewards_claimed.contains(&3));

        clock.advance_days(2);
        complete_on_days(&mut s, 3);
        assert_eq!(s.state().streak, 3);
        assert_eq!(s.state().pending_streak_reward, None);
        assert_eq!(s.state().streak_rewards_claimed.len(), 1);
    }

    #[test]
    fn test_unclaimed_reward_is_overwritten_by_next_threshold() {
        let (mut s, clock, _) = store();
        for _ in 0..7 {
            let id = s.add_task("daily", 10, 3).unwrap();
            s.toggle_task(id);
            clock.advance_days(1);
        }
        assert_eq!(s.state().pending_streak_reward, Some(7));
        s.claim_streak_reward();
        assert_eq!(s.state().streak_rewards_claimed.iter().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_claim_without_pending_is_noop() {
        let (mut s, _, storage) = store();
        s.claim_streak_reward();
        assert!(s.state().streak_rewards_claimed.is_empty());
        assert!(storage.contents().is_none());
    }

    #[test]
    fn test_clear_done_keeps_open_tasks_in_order() {
        let (mut s, _, _) = store();
        let a = s.add_task("a", 10, 3).unwrap();
        let b = s.add_task("b", 10, 3).unwrap();
        let c = s.add_task("c", 10, 3).unwrap();
        let d = s.add_task("d", 10, 3).unwrap();
        s.toggle_task(a);
        s.start_task(b);
        s.toggle_task(d);
        let xp = s.state().xp;

        s.clear_done();
        let ids: Vec<Uuid> = s.state().tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b, c]);
        assert_eq!(s.state().xp, xp);
    }

    #[test]
    fn test_delete_task() {
        let (mut s, _, _) = store();
        let a = s.add_task("a", 10, 3).unwrap();
        let b = s.add_task("b", 10, 3).unwrap();
        s.delete_task(a);
        assert!(s.task(a).is_none());
        assert!(s.task(b).is_some());
    }

    #[test]
    fn test_unknown_ids_are_silent_noops() {
        let (mut s, _, storage) = store();
        let ghost = Uuid::new_v4();
        let before = s.state().clone();
        s.start_task(ghost);
        s.set_task_status(ghost, Status::Done);
        s.complete_task(ghost, Some(3));
        s.toggle_task(ghost);
        s.update_urgency(ghost, 5);
        s.toggle_sublevel(ghost, 0);
        s.mark_milestone_celebrated(ghost);
        s.delete_task(ghost);
        assert!(s.add_subtask(ghost, "x").is_none());
        assert_eq!(s.state(), &before);
        assert!(storage.contents().is_none());
    }

    #[test]
    fn test_update_urgency_clamps() {
        let (mut s, _, _) = store();
        let id = s.add_task("a", 10, 3).unwrap();
        s.update_urgency(id, 42);
        assert_eq!(s.task(id).unwrap().urgency, 5);
        s.update_urgency(id, -1);
        assert_eq!(s.task(id).unwrap().urgency, 1);
    }

    #[test]
    fn test_milestone_celebrated_once() {
        let (mut s, _, _) = store();
        let id = s.add_task("Climb", 30, 3).unwrap();
        s.toggle_sublevel(id, 0);
        s.toggle_sublevel(id, 1);
        assert!(s.pending_milestone().is_none());
        s.toggle_sublevel(id, 2);
        assert_eq!(s.pending_milestone().map(|t| t.id), Some(id));
        assert_eq!(s.state().xp, 0);

        s.mark_milestone_celebrated(id);
        s.mark_milestone_celebrated(id);
        assert!(s.pending_milestone().is_none());

        s.toggle_sublevel(id, 1);
        s.toggle_sublevel(id, 1);
        assert!(s.task(id).unwrap().sub_levels_complete());
        assert!(s.pending_milestone().is_none());
    }

    #[test]
    fn test_toggle_sublevel_ignores_bad_index() {
        let (mut s, _, _) = store();
        let id = s.add_task("a", 10, 3).unwrap();
        s.toggle_sublevel(id, 3);
        assert_eq!(s.task(id).unwrap().sub_levels, [false; 3]);
    }

    #[test]
    fn test_subtasks() {
        let (mut s, _, _) = store();
        let id = s.add_task("Move house", 120, 4).unwrap();
        let pack = s.add_subtask(id, "Pack books").unwrap();
        let call = s.add_subtask(id, "Call movers").unwrap();
        s.toggle_subtask(id, pack);
        let t = s.task(id).unwrap();
        assert!(t.subtasks[0].done && !t.subtasks[1].done);

        s.remove_subtask(id, pack);
        let titles: Vec<&str> = s.task(id).unwrap().subtasks.iter().map(|x| x.title.as_str()).collect();
        assert_eq!(titles, vec!["Call movers"]);
        assert_eq!(s.task(id).unwrap().subtasks[0].id, call);
        assert_eq!(s.state().xp, 0);
    }

    #[test]
    fn test_sprint_lifecycle() {
        let (mut s, clock, _) = store();
        s.start_sprint(15);
        assert!(s.state().sprint_active);
        assert!(s.state().focus_mode);
        assert_eq!(s.sprint_remaining_ms(), 15 * 60_000);

        clock.advance(Duration::minutes(10));
        assert!(!s.poll_sprint());
        assert_eq!(s.sprint_remaining_ms(), 5 * 60_000);

        clock.advance(Duration::minutes(6));
        assert!(s.poll_sprint());
        assert!(!s.state().sprint_active);
        assert!(s.state().sprint_ends_at.is_none());
        assert!(s.state().focus_mode);

        // Redundant polls and stops are harmless.
        assert!(!s.poll_sprint());
        s.stop_sprint();
        assert_eq!(s.sprint_remaining_ms(), 0);
    }

    #[test]
    fn test_focus_mode_is_display_only() {
        let (mut s, _, _) = store();
        s.toggle_focus_mode();
        assert!(s.state().focus_mode);
        s.toggle_focus_mode();
        assert!(!s.state().focus_mode);
        assert_eq!((s.state().xp, s.state().streak), (0, 1));
    }

    #[test]
    fn test_quote_seen_today() {
        let (mut s, clock, _) = store();
        assert!(s.quote_due_today());
        s.mark_quote_seen_today();
        assert!(!s.quote_due_today());
        assert_eq!(s.state().quote_seen_day.as_deref(), Some("2026-6-10"));
        clock.advance_days(1);
        assert!(s.quote_due_today());
    }

    #[test]
    fn test_quick_win_picks_smallest_pending() {
        let (mut s, _, _) = store();
        let big = s.add_task("big", 90, 1).unwrap();
        let small = s.add_task("small", 10, 2).unwrap();
        s.add_task("tie", 9, 3).unwrap();
        s.toggle_task(small);
        assert_ne!(s.quick_win().map(|t| t.id), Some(small));
        assert_eq!(s.quick_win().map(|t| t.title.as_str()), Some("tie"));
        s.clear_done();
        assert!(s.task(big).is_some());
    }

    #[test]
    fn test_every_mutation_is_written_through() {
        let (mut s, _, storage) = store();
        let id = s.add_task("Persist me", 25, 3).unwrap();
        s.toggle_task(id);
        let saved = decode(&storage.contents().unwrap()).unwrap();
        assert_eq!(&saved, s.state());

        let reloaded = Store::with_clock(storage.clone(), ManualClock::at(2026, 6, 10));
        assert_eq!(reloaded.state(), s.state());
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let (mut s, _, storage) = store();
        storage.set_fail_writes(true);
        let id = s.add_task("Offline", 25, 3).unwrap();
        s.toggle_task(id);
        assert!(s.state().xp > 0);
        assert!(storage.contents().is_none());
    }

    #[test]
    fn test_subscribers_receive_snapshots_until_unsubscribed() {
        let (mut s, _, _) = store();
        let seen: Rc<RefCell<Vec<u32>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let sub = s.subscribe(move |state| sink.borrow_mut().push(state.xp));

        let id = s.add_task("Notify", 30, 4).unwrap();
        s.toggle_task(id);
        s.unsubscribe(sub);
        s.toggle_task(id);

        assert_eq!(*seen.borrow(), vec![0, 41]);
    }
}
