use crate::constants::{MIN_SPLIT_DURATION_MINUTES, MINUTES_PER_DAY};
use crate::history::{ActionKind, HistoryLedger, HistoryStatus, Restore, ViewContext};
use crate::models::{
    ConnectionHistory, OriginalNumbers, Service, TrackCatalog, TrainSet,
};
use crate::storage::SaveData;
use crate::time::{minute_of_day, time_at_minute};
use chrono::{DateTime, NaiveTime, Utc};

/// In-progress swap interaction: the first service has been picked and the
/// next click chooses its partner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapState {
    pub active: bool,
    pub source_id: Option<u64>,
}

/// Input for creating or editing a service, before validation
#[derive(Debug, Clone, Default)]
pub struct ServiceDraft {
    pub arrival_train_number: Option<String>,
    pub departure_train_number: Option<String>,
    pub scheduled_arrival: Option<NaiveTime>,
    pub scheduled_departure: Option<NaiveTime>,
    pub track_id: u32,
    pub sub_track_index: u32,
    pub train_set: TrainSet,
}

/// The single source of truth for the board.
///
/// Every mutating operation validates its input first (nothing is touched on
/// a validation error), applies the change, and records it in the history
/// ledger with full before/after snapshots. There are no ambient globals:
/// whoever owns the `AppState` owns the board.
pub struct AppState {
    pub services: Vec<Service>,
    pub next_service_id: u64,
    pub selected_service: Option<u64>,
    pub swap: SwapState,
    pub view: ViewContext,
    pub history: HistoryLedger,
    tracks: TrackCatalog,
}

impl AppState {
    #[must_use]
    pub fn new(tracks: TrackCatalog) -> Self {
        Self {
            services: Vec::new(),
            next_service_id: 1,
            selected_service: None,
            swap: SwapState::default(),
            view: ViewContext::default(),
            history: HistoryLedger::default(),
            tracks,
        }
    }

    #[must_use]
    pub fn tracks(&self) -> &TrackCatalog {
        &self.tracks
    }

    #[must_use]
    pub fn service(&self, id: u64) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn services_on_track(&self, track_id: u32) -> Vec<&Service> {
        self.services.iter().filter(|s| s.track_id == track_id).collect()
    }

    #[must_use]
    pub fn history_status(&self) -> HistoryStatus {
        self.history.status()
    }

    fn validate_draft(&self, draft: &ServiceDraft) -> Result<(), String> {
        let Some(track) = self.tracks.get(draft.track_id) else {
            return Err(format!("No track selected or unknown track {}", draft.track_id));
        };
        if draft.sub_track_index >= track.sub_track_count {
            return Err(format!(
                "Sub-track {} out of range for track {} ({} sub-tracks)",
                draft.sub_track_index, draft.track_id, track.sub_track_count
            ));
        }
        if draft.scheduled_arrival.is_none() && draft.scheduled_departure.is_none() {
            return Err("A service needs an arrival or departure time".to_string());
        }
        let has_number = [&draft.arrival_train_number, &draft.departure_train_number]
            .into_iter()
            .flatten()
            .any(|n| !n.trim().is_empty());
        if !has_number {
            return Err("A service needs a train number".to_string());
        }
        Ok(())
    }

    fn view_at_log_time(&self) -> ViewContext {
        ViewContext {
            current_start_hour: self.view.current_start_hour,
            view_hours: self.view.view_hours,
            selected_service_id: self.selected_service,
        }
    }

    fn log(
        &mut self,
        kind: ActionKind,
        description: String,
        state_before: Vec<Service>,
        now: DateTime<Utc>,
    ) {
        let view = self.view_at_log_time();
        let after = self.services.clone();
        self.history.log_action(kind, description, state_before, after, view, now);
    }

    fn recompute_next_id(&mut self) {
        self.next_service_id = self.services.iter().map(|s| s.id).max().map_or(1, |m| m + 1);
    }

    fn display_number_of(&self, id: u64) -> String {
        self.service(id)
            .and_then(|s| s.display_number().map(str::to_string))
            .unwrap_or_else(|| id.to_string())
    }

    /// Create a new service from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns a validation message and leaves the board untouched if the
    /// draft is incomplete or references an unknown track.
    pub fn add_service(&mut self, draft: ServiceDraft, now: DateTime<Utc>) -> Result<u64, String> {
        self.validate_draft(&draft)?;
        let before = self.services.clone();

        let id = self.next_service_id;
        self.next_service_id += 1;
        self.services.push(Service {
            id,
            arrival_train_number: draft.arrival_train_number,
            departure_train_number: draft.departure_train_number,
            scheduled_arrival: draft.scheduled_arrival,
            scheduled_departure: draft.scheduled_departure,
            track_id: draft.track_id,
            sub_track_index: draft.sub_track_index,
            train_set: draft.train_set,
            connection_history: None,
        });

        let number = self.display_number_of(id);
        log::info!("added service {number} (id {id})");
        self.log(ActionKind::TrainAdd, format!("Added service {number}"), before, now);
        Ok(id)
    }

    /// Edit a service in place. An unknown id is a no-op (`Ok(false)`).
    ///
    /// # Errors
    ///
    /// Returns a validation message and changes nothing if the draft is
    /// invalid.
    pub fn update_service(
        &mut self,
        id: u64,
        draft: ServiceDraft,
        now: DateTime<Utc>,
    ) -> Result<bool, String> {
        self.validate_draft(&draft)?;
        let Some(index) = self.services.iter().position(|s| s.id == id) else {
            return Ok(false);
        };
        let before = self.services.clone();

        let existing = &mut self.services[index];
        existing.arrival_train_number = draft.arrival_train_number;
        existing.departure_train_number = draft.departure_train_number;
        existing.scheduled_arrival = draft.scheduled_arrival;
        existing.scheduled_departure = draft.scheduled_departure;
        existing.track_id = draft.track_id;
        existing.sub_track_index = draft.sub_track_index;
        existing.train_set = draft.train_set;

        let number = self.display_number_of(id);
        self.log(ActionKind::TrainEdit, format!("Edited service {number}"), before, now);
        Ok(true)
    }

    /// Drag a service to another track/sub-track.
    ///
    /// # Errors
    ///
    /// Returns a validation message if the target track or sub-track does
    /// not exist; an unknown service id is a no-op (`Ok(false)`).
    pub fn move_service(
        &mut self,
        id: u64,
        track_id: u32,
        sub_track_index: u32,
        now: DateTime<Utc>,
    ) -> Result<bool, String> {
        let Some(track) = self.tracks.get(track_id) else {
            return Err(format!("Unknown track {track_id}"));
        };
        if sub_track_index >= track.sub_track_count {
            return Err(format!("Sub-track {sub_track_index} out of range for track {track_id}"));
        }
        let Some(index) = self.services.iter().position(|s| s.id == id) else {
            return Ok(false);
        };
        let before = self.services.clone();

        self.services[index].track_id = track_id;
        self.services[index].sub_track_index = sub_track_index;

        let number = self.display_number_of(id);
        self.log(
            ActionKind::TrainMove,
            format!("Moved service {number} to track {track_id}"),
            before,
            now,
        );
        Ok(true)
    }

    /// Drag a service along the timeline: both endpoints shift together,
    /// wrapping past midnight.
    pub fn shift_service(&mut self, id: u64, minutes: i64, now: DateTime<Utc>) -> bool {
        let Some(index) = self.services.iter().position(|s| s.id == id) else {
            return false;
        };
        if minutes % MINUTES_PER_DAY == 0 {
            return true;
        }
        let before = self.services.clone();

        let service = &mut self.services[index];
        service.scheduled_arrival = service
            .scheduled_arrival
            .map(|t| time_at_minute(minute_of_day(t) + minutes));
        service.scheduled_departure = service
            .scheduled_departure
            .map(|t| time_at_minute(minute_of_day(t) + minutes));

        let number = self.display_number_of(id);
        self.log(
            ActionKind::TrainMove,
            format!("Shifted service {number} by {minutes} min"),
            before,
            now,
        );
        true
    }

    /// Resize a service to new endpoint times.
    ///
    /// # Errors
    ///
    /// Returns a validation message when both endpoints are absent; an
    /// unknown id is a no-op (`Ok(false)`).
    pub fn resize_service(
        &mut self,
        id: u64,
        arrival: Option<NaiveTime>,
        departure: Option<NaiveTime>,
        now: DateTime<Utc>,
    ) -> Result<bool, String> {
        if arrival.is_none() && departure.is_none() {
            return Err("A service needs an arrival or departure time".to_string());
        }
        let Some(index) = self.services.iter().position(|s| s.id == id) else {
            return Ok(false);
        };
        let before = self.services.clone();

        self.services[index].scheduled_arrival = arrival;
        self.services[index].scheduled_departure = departure;

        let number = self.display_number_of(id);
        self.log(ActionKind::TrainResize, format!("Resized service {number}"), before, now);
        Ok(true)
    }

    /// Start the two-click swap interaction
    pub fn initiate_swap(&mut self, id: u64) -> bool {
        if self.service(id).is_none() {
            return false;
        }
        self.swap = SwapState {
            active: true,
            source_id: Some(id),
        };
        self.selected_service = Some(id);
        true
    }

    pub fn cancel_swap(&mut self) {
        self.swap = SwapState::default();
    }

    /// Second click of the swap: exchange track and sub-track between the
    /// source and target. Any lookup miss quietly ends the interaction.
    pub fn complete_swap(&mut self, target_id: u64, now: DateTime<Utc>) -> bool {
        let source_id = match self.swap {
            SwapState { active: true, source_id: Some(id) } => id,
            _ => return false,
        };
        self.cancel_swap();
        if source_id == target_id {
            return false;
        }
        let source_index = self.services.iter().position(|s| s.id == source_id);
        let target_index = self.services.iter().position(|s| s.id == target_id);
        let (Some(source_index), Some(target_index)) = (source_index, target_index) else {
            return false;
        };
        let before = self.services.clone();

        let source_slot = (
            self.services[source_index].track_id,
            self.services[source_index].sub_track_index,
        );
        let target_slot = (
            self.services[target_index].track_id,
            self.services[target_index].sub_track_index,
        );
        self.services[source_index].track_id = target_slot.0;
        self.services[source_index].sub_track_index = target_slot.1;
        self.services[target_index].track_id = source_slot.0;
        self.services[target_index].sub_track_index = source_slot.1;

        let source_number = self.display_number_of(source_id);
        let target_number = self.display_number_of(target_id);
        self.selected_service = None;
        self.log(
            ActionKind::TrainSwap,
            format!("Swapped services {source_number} and {target_number}"),
            before,
            now,
        );
        true
    }

    /// Split a service at its midpoint into an arrival part (keeps the id
    /// and the arrival number) and a departure part (new id, departure
    /// number). Both carry a connection-history record of the original.
    ///
    /// # Errors
    ///
    /// Returns a message when the service is unknown, lacks either endpoint,
    /// or is shorter than the minimum split duration.
    pub fn split_service(&mut self, id: u64, now: DateTime<Utc>) -> Result<(), String> {
        let Some(index) = self.services.iter().position(|s| s.id == id) else {
            return Err(format!("Unknown service {id}"));
        };
        let original = self.services[index].clone();
        let (Some(_), Some(_)) = (original.scheduled_arrival, original.scheduled_departure) else {
            return Err("Only services with both arrival and departure can be split".to_string());
        };
        let Some(span) = original.occupation() else {
            return Err("Service has no scheduled occupation".to_string());
        };
        if span.duration_minutes() < MIN_SPLIT_DURATION_MINUTES {
            return Err(format!(
                "Service too short to split (minimum {MIN_SPLIT_DURATION_MINUTES} minutes)"
            ));
        }
        let before = self.services.clone();

        let split_time = time_at_minute(span.start() + span.duration_minutes() / 2);
        let history = ConnectionHistory {
            original_service: OriginalNumbers {
                arrival_number: original.arrival_train_number.clone(),
                departure_number: original.departure_train_number.clone(),
            },
            connected_to: None,
            split_timestamp: now,
        };

        let mut arrival_part = original.clone();
        arrival_part.scheduled_departure = Some(split_time);
        arrival_part.departure_train_number = None;
        arrival_part.connection_history = Some(ConnectionHistory {
            connected_to: original.departure_train_number.clone(),
            ..history.clone()
        });

        let mut departure_part = original.clone();
        departure_part.id = self.next_service_id;
        departure_part.scheduled_arrival = Some(split_time);
        departure_part.arrival_train_number = None;
        departure_part.connection_history = Some(ConnectionHistory {
            connected_to: original.arrival_train_number.clone(),
            ..history
        });

        self.services.remove(index);
        self.services.insert(index, arrival_part);
        self.services.insert(index + 1, departure_part);
        self.recompute_next_id();

        let number = original
            .display_number()
            .map_or_else(|| id.to_string(), str::to_string);
        log::info!("split service {number} at {split_time}");
        self.log(ActionKind::TrainSplit, format!("Split service {number}"), before, now);
        Ok(())
    }

    /// Delete a service; an unknown id is a no-op
    pub fn delete_service(&mut self, id: u64, now: DateTime<Utc>) -> bool {
        let Some(index) = self.services.iter().position(|s| s.id == id) else {
            return false;
        };
        let number = self.display_number_of(id);
        let before = self.services.clone();

        self.services.remove(index);
        if self.selected_service == Some(id) {
            self.selected_service = None;
        }
        self.log(ActionKind::TrainDelete, format!("Removed service {number}"), before, now);
        true
    }

    /// Remove every service from the board
    pub fn clear_all(&mut self, now: DateTime<Utc>) {
        if self.services.is_empty() {
            return;
        }
        let before = self.services.clone();
        self.services.clear();
        self.selected_service = None;
        self.cancel_swap();
        self.log(ActionKind::ClearAll, "Cleared all services".to_string(), before, now);
    }

    /// Replace the board with an imported service list
    pub fn import_services(&mut self, services: Vec<Service>, now: DateTime<Utc>) {
        let before = self.services.clone();
        let count = services.len();
        self.services = services;
        self.selected_service = None;
        self.cancel_swap();
        self.recompute_next_id();
        self.log(
            ActionKind::ImportData,
            format!("Imported {count} services"),
            before,
            now,
        );
    }

    /// Update the viewport context that gets captured into history entries
    pub fn set_view(&mut self, current_start_hour: u32, view_hours: u32) {
        self.view.current_start_hour = current_start_hour;
        self.view.view_hours = view_hours;
    }

    fn apply_restore(&mut self, restore: Restore) {
        self.services = restore.services;
        self.view.current_start_hour = restore.view.current_start_hour;
        self.view.view_hours = restore.view.view_hours;
        self.selected_service = None;
        self.cancel_swap();
        self.recompute_next_id();
    }

    /// Undo the most recent action; also rewinds the captured viewport and
    /// clears any in-progress swap. Returns false when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(restore) => {
                self.apply_restore(restore);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(restore) => {
                self.apply_restore(restore);
                true
            }
            None => false,
        }
    }

    /// Jump to an arbitrary point of the existing history
    pub fn revert_to(&mut self, index: usize) -> bool {
        match self.history.revert_to(index) {
            Some(restore) => {
                self.apply_restore(restore);
                true
            }
            None => false,
        }
    }

    /// Group the following operations into one history entry
    pub fn start_batch(&mut self, description: impl Into<String>) {
        let snapshot = self.services.clone();
        let view = self.view_at_log_time();
        self.history.start_batch(description, snapshot, view);
    }

    pub fn end_batch(&mut self, now: DateTime<Utc>) {
        let current = self.services.clone();
        self.history.end_batch(current, now);
    }

    /// Abandon the open batch and roll the board back to its start
    pub fn cancel_batch(&mut self) {
        if let Some(snapshot) = self.history.cancel_batch() {
            self.services = snapshot;
            self.recompute_next_id();
        }
    }

    /// Snapshot of everything the persistence layer stores
    #[must_use]
    pub fn to_saved(&self) -> SaveData {
        SaveData {
            trains: self.services.clone(),
            next_train_id: self.next_service_id,
            current_start_hour: self.view.current_start_hour,
            view_hours: self.view.view_hours,
            action_history: self.history.entries().to_vec(),
            history_pointer: self.history.pointer_index(),
        }
    }

    /// Rebuild a board from persisted state. The id counter is bumped past
    /// any existing service even if the save disagrees.
    #[must_use]
    pub fn from_saved(data: SaveData, tracks: TrackCatalog) -> Self {
        let history = HistoryLedger::from_parts(data.action_history, data.history_pointer);
        let highest_id = data.trains.iter().map(|s| s.id).max().map_or(0, |m| m + 1);
        Self {
            next_service_id: data.next_train_id.max(highest_id).max(1),
            services: data.trains,
            selected_service: None,
            swap: SwapState::default(),
            view: ViewContext {
                current_start_hour: data.current_start_hour,
                view_hours: data.view_hours.max(1),
                selected_service_id: None,
            },
            history,
            tracks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackDefinition;
    use crate::time::parse_hhmm;

    fn tracks() -> TrackCatalog {
        TrackCatalog::new(vec![
            TrackDefinition {
                track_id: 1,
                total_length_meters: 450,
                signal_visible_length_meters: 420,
                sub_track_count: 3,
                properties: Vec::new(),
                description: String::new(),
            },
            TrackDefinition {
                track_id: 2,
                total_length_meters: 380,
                signal_visible_length_meters: 350,
                sub_track_count: 2,
                properties: Vec::new(),
                description: String::new(),
            },
        ])
    }

    fn now() -> DateTime<Utc> {
        "2025-06-01T12:00:00Z".parse().expect("valid timestamp")
    }

    fn draft(arr: &str, dep: &str, track: u32) -> ServiceDraft {
        ServiceDraft {
            arrival_train_number: Some("424".to_string()),
            departure_train_number: Some("437".to_string()),
            scheduled_arrival: Some(parse_hhmm(arr).expect("valid time")),
            scheduled_departure: Some(parse_hhmm(dep).expect("valid time")),
            track_id: track,
            sub_track_index: 0,
            train_set: TrainSet::default(),
        }
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut state = AppState::new(tracks());
        let first = state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        let second = state.add_service(draft("11:00", "11:30", 1), now()).expect("add");
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(state.services.len(), 2);
        assert_eq!(state.next_service_id, 3);
    }

    #[test]
    fn test_add_rejects_unknown_track_without_mutation() {
        let mut state = AppState::new(tracks());
        let result = state.add_service(draft("10:00", "10:30", 9), now());
        assert!(result.is_err());
        assert!(state.services.is_empty());
        assert!(!state.history_status().can_undo);
    }

    #[test]
    fn test_add_rejects_sub_track_out_of_range() {
        let mut state = AppState::new(tracks());
        let mut d = draft("10:00", "10:30", 2);
        d.sub_track_index = 2;
        assert!(state.add_service(d, now()).is_err());
    }

    #[test]
    fn test_add_requires_time_and_number() {
        let mut state = AppState::new(tracks());
        let mut no_times = draft("10:00", "10:30", 1);
        no_times.scheduled_arrival = None;
        no_times.scheduled_departure = None;
        assert!(state.add_service(no_times, now()).is_err());

        let mut no_numbers = draft("10:00", "10:30", 1);
        no_numbers.arrival_train_number = None;
        no_numbers.departure_train_number = Some("  ".to_string());
        assert!(state.add_service(no_numbers, now()).is_err());
    }

    #[test]
    fn test_undo_redo_round_trips_service_list() {
        let mut state = AppState::new(tracks());
        state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        let with_one = state.services.clone();
        state.add_service(draft("11:00", "11:30", 1), now()).expect("add");
        let with_two = state.services.clone();

        assert!(state.undo());
        assert_eq!(state.services, with_one);
        assert!(state.redo());
        assert_eq!(state.services, with_two);
    }

    #[test]
    fn test_undo_clears_swap_interaction() {
        let mut state = AppState::new(tracks());
        let id = state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        state.add_service(draft("11:00", "11:30", 1), now()).expect("add");
        state.initiate_swap(id);
        assert!(state.swap.active);
        assert!(state.undo());
        assert!(!state.swap.active);
        assert_eq!(state.selected_service, None);
    }

    #[test]
    fn test_move_service_validates_target() {
        let mut state = AppState::new(tracks());
        let id = state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        assert!(state.move_service(id, 9, 0, now()).is_err());
        assert!(state.move_service(id, 2, 5, now()).is_err());
        assert_eq!(state.move_service(id, 2, 1, now()), Ok(true));
        assert_eq!(state.service(id).expect("service").track_id, 2);
        // Unknown service id quietly no-ops
        assert_eq!(state.move_service(99, 1, 0, now()), Ok(false));
    }

    #[test]
    fn test_shift_service_wraps_midnight() {
        let mut state = AppState::new(tracks());
        let id = state.add_service(draft("23:30", "23:50", 1), now()).expect("add");
        assert!(state.shift_service(id, 30, now()));
        let service = state.service(id).expect("service");
        assert_eq!(service.scheduled_arrival, parse_hhmm("00:00").ok());
        assert_eq!(service.scheduled_departure, parse_hhmm("00:20").ok());
    }

    #[test]
    fn test_swap_exchanges_slots() {
        let mut state = AppState::new(tracks());
        let a = state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        let mut second = draft("11:00", "11:30", 2);
        second.sub_track_index = 1;
        let b = state.add_service(second, now()).expect("add");

        assert!(state.initiate_swap(a));
        assert!(state.complete_swap(b, now()));

        let service_a = state.service(a).expect("a");
        let service_b = state.service(b).expect("b");
        assert_eq!((service_a.track_id, service_a.sub_track_index), (2, 1));
        assert_eq!((service_b.track_id, service_b.sub_track_index), (1, 0));
        assert!(!state.swap.active);
    }

    #[test]
    fn test_swap_with_missing_target_ends_interaction() {
        let mut state = AppState::new(tracks());
        let a = state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        assert!(state.initiate_swap(a));
        assert!(!state.complete_swap(99, now()));
        assert!(!state.swap.active);
    }

    #[test]
    fn test_split_produces_two_linked_parts() {
        let mut state = AppState::new(tracks());
        let id = state.add_service(draft("10:00", "11:00", 1), now()).expect("add");
        state.split_service(id, now()).expect("split");

        assert_eq!(state.services.len(), 2);
        let arrival_part = &state.services[0];
        let departure_part = &state.services[1];

        assert_eq!(arrival_part.id, id);
        assert_eq!(arrival_part.arrival_train_number.as_deref(), Some("424"));
        assert_eq!(arrival_part.departure_train_number, None);
        assert_eq!(arrival_part.scheduled_departure, parse_hhmm("10:30").ok());

        assert_ne!(departure_part.id, id);
        assert_eq!(departure_part.arrival_train_number, None);
        assert_eq!(departure_part.departure_train_number.as_deref(), Some("437"));
        assert_eq!(departure_part.scheduled_arrival, parse_hhmm("10:30").ok());
        assert_eq!(departure_part.scheduled_departure, parse_hhmm("11:00").ok());

        for part in &state.services {
            let history = part.connection_history.as_ref().expect("history");
            assert_eq!(history.original_service.arrival_number.as_deref(), Some("424"));
            assert_eq!(history.original_service.departure_number.as_deref(), Some("437"));
        }
        assert_eq!(state.next_service_id, departure_part.id + 1);
    }

    #[test]
    fn test_split_rejects_short_service() {
        let mut state = AppState::new(tracks());
        let id = state.add_service(draft("10:00", "10:15", 1), now()).expect("add");
        assert!(state.split_service(id, now()).is_err());
        assert_eq!(state.services.len(), 1);
    }

    #[test]
    fn test_delete_and_clear() {
        let mut state = AppState::new(tracks());
        let id = state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        state.selected_service = Some(id);
        assert!(state.delete_service(id, now()));
        assert_eq!(state.selected_service, None);
        assert!(!state.delete_service(id, now()));

        state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        state.clear_all(now());
        assert!(state.services.is_empty());
        assert!(state.undo());
        assert_eq!(state.services.len(), 1);
    }

    #[test]
    fn test_batch_collapses_to_single_entry() {
        let mut state = AppState::new(tracks());
        state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        let entries_before = state.history.entries().len();

        state.start_batch("Rearrange board");
        state.shift_service(1, 15, now());
        state
            .move_service(1, 2, 0, now())
            .expect("move");
        state.end_batch(now());

        assert_eq!(state.history.entries().len(), entries_before + 1);
        // One undo takes the whole batch back
        assert!(state.undo());
        let service = state.service(1).expect("service");
        assert_eq!(service.track_id, 1);
        assert_eq!(service.scheduled_arrival, parse_hhmm("10:00").ok());
    }

    #[test]
    fn test_cancel_batch_rolls_back_silently() {
        let mut state = AppState::new(tracks());
        state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        let entries_before = state.history.entries().len();
        let services_before = state.services.clone();

        state.start_batch("doomed");
        state.shift_service(1, 60, now());
        state.cancel_batch();

        assert_eq!(state.services, services_before);
        assert_eq!(state.history.entries().len(), entries_before);
    }

    #[test]
    fn test_saved_state_round_trip() {
        let mut state = AppState::new(tracks());
        state.set_view(8, 6);
        state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        state.add_service(draft("11:00", "11:30", 2), now()).expect("add");
        state.undo();

        let saved = state.to_saved();
        let restored = AppState::from_saved(saved, tracks());

        assert_eq!(restored.services, state.services);
        assert_eq!(restored.next_service_id, state.next_service_id);
        assert_eq!(restored.view.current_start_hour, 8);
        assert_eq!(restored.history.pointer_index(), state.history.pointer_index());
        assert_eq!(restored.history_status(), state.history_status());
    }

    #[test]
    fn test_from_saved_bumps_stale_id_counter() {
        let saved = SaveData {
            trains: vec![Service {
                id: 17,
                arrival_train_number: Some("424".to_string()),
                departure_train_number: None,
                scheduled_arrival: parse_hhmm("10:00").ok(),
                scheduled_departure: parse_hhmm("10:30").ok(),
                track_id: 1,
                sub_track_index: 0,
                train_set: TrainSet::default(),
                connection_history: None,
            }],
            next_train_id: 2,
            ..SaveData::default()
        };
        let state = AppState::from_saved(saved, tracks());
        assert_eq!(state.next_service_id, 18);
    }

    #[test]
    fn test_undo_restores_view_context() {
        let mut state = AppState::new(tracks());
        state.set_view(8, 6);
        state.add_service(draft("10:00", "10:30", 1), now()).expect("add");
        state.set_view(14, 3);
        assert!(state.undo());
        assert_eq!(state.view.current_start_hour, 8);
        assert_eq!(state.view.view_hours, 6);
    }
}
