//! Conflict, proximity, and length-capacity detection.
//!
//! The scan is rebuilt from scratch on every change: no incremental state,
//! no ordering assumptions on the input, and no failure mode for well-typed
//! input (empty boards and one-ended services included).

mod types;

pub use types::{ConflictConfig, ServiceFlags};

use crate::constants::MINUTES_PER_DAY;
use crate::models::{CapacityStatus, Service, TrackCatalog, VehicleCatalog};
use crate::time::TimeSpan;
use std::collections::HashMap;

/// Forward gap in minutes from one service's departure to the next one's
/// arrival on the circular day
fn circular_gap_minutes(from_end: i64, to_start: i64) -> i64 {
    (to_start - from_end).rem_euclid(MINUTES_PER_DAY)
}

/// Compute the flag set for every service.
///
/// Services sharing a `(track, sub-track)` pair are scanned in start order:
/// an overlapping adjacent pair is `CONFLICTING`, a gap within the configured
/// tolerance is `PROXIMITY_WARNING` on both sides. Touching exactly is not a
/// conflict. Independently, every service is checked against its track's
/// length limits; an unknown track id simply skips the length check.
#[must_use]
pub fn detect_conflicts(
    services: &[Service],
    tracks: &TrackCatalog,
    vehicles: &VehicleCatalog,
    config: &ConflictConfig,
) -> HashMap<u64, ServiceFlags> {
    let mut flags: HashMap<u64, ServiceFlags> = services
        .iter()
        .map(|s| (s.id, ServiceFlags::empty()))
        .collect();

    for service in services {
        let length = vehicles.train_set_length(&service.train_set);
        if let Some(track) = tracks.get(service.track_id) {
            match track.capacity_status(length) {
                CapacityStatus::Impossible => {
                    if let Some(entry) = flags.get_mut(&service.id) {
                        *entry |= ServiceFlags::LENGTH_IMPOSSIBLE;
                    }
                }
                CapacityStatus::Warning => {
                    if let Some(entry) = flags.get_mut(&service.id) {
                        *entry |= ServiceFlags::LENGTH_WARNING;
                    }
                }
                CapacityStatus::Ok { .. } => {}
            }
        }
    }

    let mut groups: HashMap<(u32, u32), Vec<(u64, TimeSpan)>> = HashMap::new();
    for service in services {
        if let Some(span) = service.occupation() {
            groups
                .entry((service.track_id, service.sub_track_index))
                .or_default()
                .push((service.id, span));
        }
    }

    for group in groups.values_mut() {
        group.sort_by_key(|(id, span)| (span.start(), *id));

        for pair in group.windows(2) {
            let (first_id, first_span) = pair[0];
            let (second_id, second_span) = pair[1];

            if first_span.overlaps(&second_span) {
                if let Some(entry) = flags.get_mut(&first_id) {
                    *entry |= ServiceFlags::CONFLICTING;
                }
                if let Some(entry) = flags.get_mut(&second_id) {
                    *entry |= ServiceFlags::CONFLICTING;
                }
            } else {
                let gap = circular_gap_minutes(first_span.end(), second_span.start());
                if gap <= config.proximity_warning_minutes {
                    if let Some(entry) = flags.get_mut(&first_id) {
                        *entry |= ServiceFlags::PROXIMITY_WARNING;
                    }
                    if let Some(entry) = flags.get_mut(&second_id) {
                        *entry |= ServiceFlags::PROXIMITY_WARNING;
                    }
                }
            }
        }
    }

    flags
}
