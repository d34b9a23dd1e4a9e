use serde::{Deserialize, Serialize};

/// Result of checking a train's physical length against a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityStatus {
    /// Fits within the signal-visible length
    Ok { utilization_percent: u32 },
    /// Longer than the signal-visible length but still fits the track
    Warning,
    /// Longer than the physical track
    Impossible,
}

/// Static description of a physical track, supplied by the infrastructure
/// layer and read-only from the engine's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDefinition {
    pub track_id: u32,
    pub total_length_meters: u32,
    pub signal_visible_length_meters: u32,
    pub sub_track_count: u32,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl TrackDefinition {
    /// Classify a train length against this track's capacity limits
    #[must_use]
    pub fn capacity_status(&self, train_length_meters: u32) -> CapacityStatus {
        if train_length_meters > self.total_length_meters {
            CapacityStatus::Impossible
        } else if train_length_meters > self.signal_visible_length_meters {
            CapacityStatus::Warning
        } else {
            let utilization_percent = if self.signal_visible_length_meters == 0 {
                0
            } else {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let pct = (f64::from(train_length_meters)
                    / f64::from(self.signal_visible_length_meters)
                    * 100.0)
                    .round() as u32;
                pct
            };
            CapacityStatus::Ok { utilization_percent }
        }
    }
}

/// The set of tracks on the board, in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackCatalog {
    tracks: Vec<TrackDefinition>,
}

impl TrackCatalog {
    #[must_use]
    pub fn new(tracks: Vec<TrackDefinition>) -> Self {
        Self { tracks }
    }

    #[must_use]
    pub fn get(&self, track_id: u32) -> Option<&TrackDefinition> {
        self.tracks.iter().find(|t| t.track_id == track_id)
    }

    #[must_use]
    pub fn tracks(&self) -> &[TrackDefinition] {
        &self.tracks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TrackDefinition {
        TrackDefinition {
            track_id: 1,
            total_length_meters: 450,
            signal_visible_length_meters: 420,
            sub_track_count: 3,
            properties: vec!["regional_platform".to_string()],
            description: "Regional traffic".to_string(),
        }
    }

    #[test]
    fn test_capacity_ok_with_utilization() {
        assert_eq!(
            track().capacity_status(210),
            CapacityStatus::Ok { utilization_percent: 50 }
        );
    }

    #[test]
    fn test_capacity_warning_above_signal_visible() {
        assert_eq!(track().capacity_status(421), CapacityStatus::Warning);
        assert_eq!(track().capacity_status(450), CapacityStatus::Warning);
    }

    #[test]
    fn test_capacity_impossible_above_total() {
        assert_eq!(track().capacity_status(451), CapacityStatus::Impossible);
    }

    #[test]
    fn test_capacity_boundary_at_signal_visible() {
        assert_eq!(
            track().capacity_status(420),
            CapacityStatus::Ok { utilization_percent: 100 }
        );
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = TrackCatalog::new(vec![track()]);
        assert!(catalog.get(1).is_some());
        assert!(catalog.get(2).is_none());
        assert_eq!(catalog.len(), 1);
    }
}
