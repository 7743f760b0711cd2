//! Persisted game state and the storage backends that hold it.
//!
//! The whole store is one JSON blob under the `questlist-v1` key, wrapped in a
//! small envelope carrying the schema version:
//!
//! ```json
//! { "version": 2, "state": { "tasks": [], "xp": 0, "levelId": 1, ... } }
//! ```
//!
//! Backends only move that blob around; decoding, migration and invariant
//! repair happen here so every backend loads identically.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::StorageError;
use crate::game::level_for_xp;
use crate::task::Task;

/// Fixed storage key; also the default file stem.
pub const STORAGE_KEY: &str = "questlist-v1";

/// Version written by this build. Version 2 guarantees `streak >= 1`.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Everything the store owns, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    pub tasks: Vec<Task>,
    pub xp: u32,
    /// Cached projection of `xp`; recomputed on every mutation and on load.
    pub level_id: u8,
    pub streak: u32,
    pub last_complete_day: Option<String>,
    pub sprint_active: bool,
    pub sprint_ends_at: Option<i64>,
    pub focus_mode: bool,
    pub quote_seen_day: Option<String>,
    pub celebrated_milestones: BTreeSet<Uuid>,
    pub pending_streak_reward: Option<u32>,
    pub streak_rewards_claimed: BTreeSet<u32>,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            tasks: Vec::new(),
            xp: 0,
            level_id: 1,
            streak: 1,
            last_complete_day: None,
            sprint_active: false,
            sprint_ends_at: None,
            focus_mode: false,
            quote_seen_day: None,
            celebrated_milestones: BTreeSet::new(),
            pending_streak_reward: None,
            streak_rewards_claimed: BTreeSet::new(),
        }
    }
}

impl GameState {
    /// Get a task by id.
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by id.
    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn pending_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.is_done())
    }

    pub fn done_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.is_done())
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    state: GameState,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a GameState,
}

/// Serialize the state into the versioned blob.
pub fn encode(state: &GameState) -> Result<String, StorageError> {
    let envelope = EnvelopeRef { version: CURRENT_SCHEMA_VERSION, state };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse a blob, migrating older schema versions and repairing derived fields.
pub fn decode(blob: &str) -> Result<GameState, StorageError> {
    let Envelope { version, mut state } = serde_json::from_str(blob)?;
    if version < CURRENT_SCHEMA_VERSION {
        migrate(&mut state, version);
    }
    for task in state.tasks.iter_mut() {
        task.normalise();
    }
    state.level_id = level_for_xp(state.xp);
    Ok(state)
}

/// Bring a state written by an older schema up to date.
fn migrate(state: &mut GameState, from_version: u32) {
    let streak = state.streak.max(1);
    if streak != state.streak {
        info!(from_version, stored = state.streak, "migrating streak to {streak}");
    }
    state.streak = streak;
}

/// A durable home for the single state blob.
pub trait Storage {
    /// Return the stored blob, or `None` if nothing has been written yet.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored blob.
    fn write(&mut self, blob: &str) -> Result<(), StorageError>;

    /// Keep a copy of a blob that could not be decoded, so the next write
    /// does not destroy it.
    fn back_up(&mut self, blob: &str) -> Result<(), StorageError>;
}

/// Load state from a backend, starting fresh if it is missing or unreadable.
pub fn load_state(storage: &mut dyn Storage) -> GameState {
    match storage.read() {
        Ok(None) => GameState::default(),
        Ok(Some(blob)) => match decode(&blob) {
            Ok(state) => state,
            Err(e) => {
                warn!("Error parsing saved state, starting fresh: {e}");
                if let Err(e) = storage.back_up(&blob) {
                    warn!("Failed to back up unreadable state: {e}");
                }
                GameState::default()
            }
        },
        Err(e) => {
            warn!("Error reading saved state, starting fresh: {e}");
            GameState::default()
        }
    }
}

/// JSON file on local disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage { path: path.into() }
    }

    /// `<dir>/questlist-v1.json`
    pub fn in_dir(dir: &Path) -> Self {
        FileStorage::new(dir.join(format!("{STORAGE_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable state file is copied before starting fresh.
    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }
}

impl Storage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    /// Atomic-ish write via temp + rename.
    fn write(&mut self, blob: &str) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|_| StorageError::NoDirectory(dir.to_path_buf()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(blob.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }

    fn back_up(&mut self, blob: &str) -> Result<(), StorageError> {
        let backup = self.backup_path();
        fs::write(&backup, blob)?;
        warn!("Unreadable state saved to {}", backup.display());
        Ok(())
    }
}

/// In-memory backend. Clones share the same slot, so a test can keep a handle
/// and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Rc<RefCell<Option<String>>>,
    backup: Rc<RefCell<Option<String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        let storage = Self::default();
        *storage.slot.borrow_mut() = Some(blob.into());
        storage
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    pub fn backup(&self) -> Option<String> {
        self.backup.borrow().clone()
    }

    /// Make subsequent writes fail, to exercise best-effort persistence.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.borrow().clone())
    }

    fn write(&mut self, blob: &str) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::Rejected("memory storage is read-only".into()));
        }
        *self.slot.borrow_mut() = Some(blob.to_string());
        Ok(())
    }

    fn back_up(&mut self, blob: &str) -> Result<(), StorageError> {
        *self.backup.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}
