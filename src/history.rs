use crate::constants::MAX_HISTORY_ENTRIES;
use crate::models::Service;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of change an entry records. The wire names match the legacy
/// save format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    TrainAdd,
    TrainDelete,
    TrainEdit,
    TrainMove,
    TrainResize,
    TrainSwap,
    TrainSplit,
    ViewChange,
    BatchOperation,
    ImportData,
    ClearAll,
}

/// Viewport context captured alongside each entry so undo/redo also rewinds
/// what the user was looking at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewContext {
    #[serde(default)]
    pub current_start_hour: u32,
    #[serde(default = "default_view_hours")]
    pub view_hours: u32,
    #[serde(default)]
    pub selected_service_id: Option<u64>,
}

fn default_view_hours() -> u32 {
    12
}

impl Default for ViewContext {
    fn default() -> Self {
        Self {
            current_start_hour: 6,
            view_hours: default_view_hours(),
            selected_service_id: None,
        }
    }
}

/// One immutable history entry with full before/after snapshots.
///
/// Snapshots are owned copies taken at log time, so later mutation of the
/// live service list can never corrupt history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub description: String,
    #[serde(rename = "previousTrainData")]
    pub state_before: Vec<Service>,
    #[serde(rename = "newTrainData")]
    pub state_after: Vec<Service>,
    #[serde(rename = "viewState", default)]
    pub view: ViewContext,
}

/// Snapshot handed back by undo/redo/revert for the caller to apply
#[derive(Debug, Clone, PartialEq)]
pub struct Restore {
    pub services: Vec<Service>,
    pub view: ViewContext,
}

/// Undo/redo availability summary for the toolbar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_description: Option<String>,
    pub redo_description: Option<String>,
    /// 1-based position of the pointer; 0 means before the first entry
    pub position: usize,
    pub length: usize,
}

struct BatchState {
    description: String,
    snapshot: Vec<Service>,
    view: ViewContext,
}

/// Append-only action log with a movable pointer.
///
/// The pointer sits on the last applied entry; `None` means nothing to undo.
/// Appending while the pointer is not at the head discards the stale redo
/// branch, so history stays linear.
pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    pointer: Option<usize>,
    batch: Option<BatchState>,
    max_entries: usize,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(MAX_HISTORY_ENTRIES)
    }
}

impl HistoryLedger {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            pointer: None,
            batch: None,
            max_entries: max_entries.max(1),
        }
    }

    /// Rebuild a ledger from persisted parts; the pointer uses the legacy
    /// -1-based index and is clamped into range.
    #[must_use]
    pub fn from_parts(entries: Vec<HistoryEntry>, pointer_index: i64) -> Self {
        let pointer = usize::try_from(pointer_index)
            .ok()
            .filter(|&p| p < entries.len());
        Self {
            entries,
            pointer,
            batch: None,
            max_entries: MAX_HISTORY_ENTRIES,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Legacy -1-based pointer index, for persistence
    #[must_use]
    pub fn pointer_index(&self) -> i64 {
        self.pointer.map_or(-1, |p| {
            i64::try_from(p).unwrap_or(i64::MAX)
        })
    }

    /// Record one action. Returns the entry id, or `None` while a batch is
    /// open (the batch logs a single entry at its end).
    pub fn log_action(
        &mut self,
        kind: ActionKind,
        description: impl Into<String>,
        state_before: Vec<Service>,
        state_after: Vec<Service>,
        view: ViewContext,
        now: DateTime<Utc>,
    ) -> Option<String> {
        if self.batch.is_some() {
            return None;
        }
        Some(self.append(kind, description.into(), state_before, state_after, view, now))
    }

    fn append(
        &mut self,
        kind: ActionKind,
        description: String,
        state_before: Vec<Service>,
        state_after: Vec<Service>,
        view: ViewContext,
        now: DateTime<Utc>,
    ) -> String {
        // Discard the stale redo branch before appending
        let keep = self.pointer.map_or(0, |p| p + 1);
        self.entries.truncate(keep);

        let id = uuid::Uuid::new_v4().to_string();
        self.entries.push(HistoryEntry {
            id: id.clone(),
            timestamp: now,
            kind,
            description: description.clone(),
            state_before,
            state_after,
            view,
        });
        self.pointer = Some(self.entries.len() - 1);

        if self.entries.len() > self.max_entries {
            let evicted = self.entries.len() - self.max_entries;
            self.entries.drain(0..evicted);
            self.pointer = self
                .pointer
                .and_then(|p| p.checked_sub(evicted));
        }

        log::debug!(
            "action logged: {description} ({} entries, pointer {})",
            self.entries.len(),
            self.pointer_index()
        );
        id
    }

    /// Step back one entry, returning the state to restore.
    /// `None` (and no mutation) when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Restore> {
        let current = self.pointer?;
        let entry = &self.entries[current];
        let restore = Restore {
            services: entry.state_before.clone(),
            view: entry.view.clone(),
        };
        self.pointer = current.checked_sub(1);
        Some(restore)
    }

    /// Step forward one entry, returning the state to restore.
    /// `None` when already at the head.
    pub fn redo(&mut self) -> Option<Restore> {
        let next = self.pointer.map_or(0, |p| p + 1);
        let entry = self.entries.get(next)?;
        let restore = Restore {
            services: entry.state_after.clone(),
            view: entry.view.clone(),
        };
        self.pointer = Some(next);
        Some(restore)
    }

    /// Jump to an arbitrary existing entry without truncating anything.
    /// The pointer is set directly, unlike append's truncate-on-log.
    pub fn revert_to(&mut self, index: usize) -> Option<Restore> {
        let entry = self.entries.get(index)?;
        let restore = Restore {
            services: entry.state_after.clone(),
            view: entry.view.clone(),
        };
        self.pointer = Some(index);
        Some(restore)
    }

    /// Open a batch: individual `log_action` calls are suppressed until
    /// `end_batch` logs one entry spanning the whole group.
    pub fn start_batch(
        &mut self,
        description: impl Into<String>,
        snapshot: Vec<Service>,
        view: ViewContext,
    ) {
        if self.batch.is_some() {
            log::warn!("batch already open; replacing its snapshot");
        }
        self.batch = Some(BatchState {
            description: description.into(),
            snapshot,
            view,
        });
    }

    /// Close the batch and log it as a single entry. Returns the entry id,
    /// or `None` if no batch was open.
    pub fn end_batch(&mut self, current: Vec<Service>, now: DateTime<Utc>) -> Option<String> {
        let batch = self.batch.take()?;
        Some(self.append(
            ActionKind::BatchOperation,
            batch.description,
            batch.snapshot,
            current,
            batch.view,
            now,
        ))
    }

    /// Abandon the batch; the caller restores the returned snapshot.
    /// Nothing is logged.
    pub fn cancel_batch(&mut self) -> Option<Vec<Service>> {
        self.batch.take().map(|b| b.snapshot)
    }

    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.batch.is_some()
    }

    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        let next = self.pointer.map_or(0, |p| p + 1);
        HistoryStatus {
            can_undo: self.pointer.is_some(),
            can_redo: next < self.entries.len(),
            undo_description: self
                .pointer
                .map(|p| self.entries[p].description.clone()),
            redo_description: self.entries.get(next).map(|e| e.description.clone()),
            position: next,
            length: self.entries.len(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pointer = None;
        self.batch = None;
    }
}
