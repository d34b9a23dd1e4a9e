pub mod migrations;

use crate::history::HistoryEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

pub const CURRENT_SAVE_VERSION: u32 = 2;
pub const MAIN_STATE_KEY: &str = "dispatch_board_state";
pub const BACKUP_STATE_KEY: &str = "dispatch_board_state_backup";

/// Persisted board state, inside the versioned envelope's `data` field.
/// Field names match the legacy localStorage format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    #[serde(default)]
    pub trains: Vec<crate::models::Service>,
    #[serde(default)]
    pub next_train_id: u64,
    #[serde(default)]
    pub current_start_hour: u32,
    #[serde(default)]
    pub view_hours: u32,
    #[serde(default)]
    pub action_history: Vec<HistoryEntry>,
    #[serde(default = "default_history_pointer")]
    pub history_pointer: i64,
}

fn default_history_pointer() -> i64 {
    -1
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveEnvelope<'a> {
    version: u32,
    timestamp: DateTime<Utc>,
    data: &'a SaveData,
}

/// Key-value backend for persisted state. The browser's localStorage, a file
/// directory, and the in-memory test double all implement this.
pub trait StateStore {
    /// # Errors
    /// Returns a backend failure description.
    fn read(&self, key: &str) -> Result<Option<String>, String>;

    /// # Errors
    /// Returns a backend failure description, e.g. quota exhaustion.
    fn write(&mut self, key: &str, value: &str) -> Result<(), String>;

    /// # Errors
    /// Returns a backend failure description.
    fn remove(&mut self, key: &str) -> Result<(), String>;
}

/// In-memory store; also the test double for quota failures
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    failing_writes: u32,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail, simulating quota exhaustion
    pub fn fail_writes(&mut self, count: u32) {
        self.failing_writes = count;
    }
}

impl StateStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), String> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err("quota exceeded".to_string());
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), String> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, String> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(format!("Failed to read {key}: {e}")),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), String> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Failed to create state directory: {e}"))?;
        std::fs::write(self.path_for(key), value).map_err(|e| format!("Failed to write {key}: {e}"))
    }

    fn remove(&mut self, key: &str) -> Result<(), String> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to remove {key}: {e}")),
        }
    }
}

fn save_version(value: &Value) -> u32 {
    match value.get("version") {
        None => 1,
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()).unwrap_or(1),
        // The original app wrote string versions like "2.0"
        Some(Value::String(s)) => s.split('.').next().and_then(|p| p.parse().ok()).unwrap_or(1),
        Some(_) => 1,
    }
}

/// History entries from foreign saves may not conform; keep what parses
fn sanitize_history(data: &mut Value) {
    if let Some(entries) = data.get_mut("actionHistory").and_then(Value::as_array_mut) {
        let before = entries.len();
        entries.retain(|entry| serde_json::from_value::<HistoryEntry>(entry.clone()).is_ok());
        let dropped = before - entries.len();
        if dropped > 0 {
            log::warn!("dropped {dropped} unreadable history entries while loading");
        }
    }
}

/// Parse a raw save, migrating older or legacy (version-less) shapes.
///
/// # Errors
///
/// Returns a description when the JSON is corrupt or no migration path
/// exists.
pub fn parse_save(raw: &str) -> Result<SaveData, String> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| format!("Corrupt saved state: {e}"))?;
    let version = save_version(&value);
    let migrated = migrations::create_migration_chain().migrate(value, version, CURRENT_SAVE_VERSION)?;

    let mut data = migrated
        .get("data")
        .cloned()
        .ok_or_else(|| "Saved state has no data section".to_string())?;
    sanitize_history(&mut data);
    serde_json::from_value(data).map_err(|e| format!("Saved state does not match schema: {e}"))
}

/// Saves and loads the board state through a [`StateStore`], keeping a
/// backup of the previous save and tolerating older formats on load.
pub struct PersistenceEngine<S: StateStore> {
    store: S,
}

impl<S: StateStore> PersistenceEngine<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the state, retaining the previous save as a backup. On a write
    /// failure the backup is dropped to free space and the write retried
    /// once; if that also fails the error is returned and in-memory state is
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns the backend failure after the retry also failed.
    pub fn save(&mut self, data: &SaveData, now: DateTime<Utc>) -> Result<(), String> {
        let envelope = SaveEnvelope {
            version: CURRENT_SAVE_VERSION,
            timestamp: now,
            data,
        };
        let serialized = serde_json::to_string(&envelope)
            .map_err(|e| format!("Failed to serialize state: {e}"))?;

        if let Ok(Some(existing)) = self.store.read(MAIN_STATE_KEY) {
            if let Err(e) = self.store.write(BACKUP_STATE_KEY, &existing) {
                log::warn!("failed to keep backup copy: {e}");
            }
        }

        if let Err(first) = self.store.write(MAIN_STATE_KEY, &serialized) {
            log::warn!("save failed ({first}), dropping backup and retrying");
            let _ = self.store.remove(BACKUP_STATE_KEY);
            self.store
                .write(MAIN_STATE_KEY, &serialized)
                .map_err(|retry| format!("Failed to save state after cleanup: {retry}"))?;
        }
        Ok(())
    }

    /// Load the saved state, if any. A corrupt main save falls back to the
    /// backup copy before giving up.
    ///
    /// # Errors
    ///
    /// Returns a description when both the main save and the backup are
    /// unreadable.
    pub fn load(&self) -> Result<Option<SaveData>, String> {
        let Some(raw) = self.store.read(MAIN_STATE_KEY)? else {
            return Ok(None);
        };
        match parse_save(&raw) {
            Ok(data) => Ok(Some(data)),
            Err(main_error) => {
                log::warn!("main save unreadable ({main_error}), trying backup");
                match self.store.read(BACKUP_STATE_KEY)? {
                    Some(backup_raw) => parse_save(&backup_raw).map(Some).map_err(|backup_error| {
                        format!("Main save unreadable ({main_error}); backup too ({backup_error})")
                    }),
                    None => Err(main_error),
                }
            }
        }
    }
}
