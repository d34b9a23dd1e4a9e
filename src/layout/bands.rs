use super::occupancy::max_simultaneous;
use crate::models::{Service, TrackDefinition};
use crate::time::TimeSpan;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Band heights per max-simultaneous count. Index k-1 holds the height for
/// k stacked services; counts beyond the table reuse the last entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightPolicy {
    pub band_heights_px: Vec<u32>,
    pub min_lane_height_px: u32,
}

impl Default for HeightPolicy {
    fn default() -> Self {
        Self {
            band_heights_px: vec![48, 48, 52, 56, 60],
            min_lane_height_px: 8,
        }
    }
}

impl HeightPolicy {
    /// Check the structural requirements: non-empty, monotonically
    /// non-decreasing, and equal heights for one and two stacked services.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated requirement.
    pub fn validate(&self) -> Result<(), String> {
        if self.band_heights_px.is_empty() {
            return Err("height policy needs at least one entry".to_string());
        }
        if self.band_heights_px.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err("band heights must be non-decreasing".to_string());
        }
        if self.band_heights_px.len() >= 2 && self.band_heights_px[0] != self.band_heights_px[1] {
            return Err("single and double stacking must share a height".to_string());
        }
        Ok(())
    }

    /// Band height for a track with `max_simultaneous` stacked services.
    /// An idle track takes the single-service height.
    #[must_use]
    pub fn band_height(&self, max_simultaneous: usize) -> u32 {
        let Some(last) = self.band_heights_px.last() else {
            return self.min_lane_height_px;
        };
        let index = max_simultaneous.saturating_sub(1);
        self.band_heights_px.get(index).copied().unwrap_or(*last)
    }

    /// Height of one lane inside a band, floored so dense tracks stay legible
    #[must_use]
    pub fn lane_height(&self, band_height_px: u32, lanes: usize) -> u32 {
        if lanes == 0 {
            return band_height_px;
        }
        #[allow(clippy::cast_possible_truncation)]
        let divided = band_height_px / lanes as u32;
        divided.max(self.min_lane_height_px)
    }
}

/// Pixel geometry of one track row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackBand {
    pub track_id: u32,
    pub top_px: u32,
    pub height_px: u32,
}

/// Vertical layout for every track, in catalog order: each band's height
/// follows its peak occupancy and the tops accumulate with no gaps. Derived
/// data; recomputed on every pass, never persisted.
#[must_use]
pub fn track_layouts(
    tracks: &[TrackDefinition],
    services: &[Service],
    policy: &HeightPolicy,
) -> Vec<TrackBand> {
    let mut spans_by_track: HashMap<u32, Vec<TimeSpan>> = HashMap::new();
    for service in services {
        if let Some(span) = service.occupation() {
            spans_by_track.entry(service.track_id).or_default().push(span);
        }
    }

    let mut layouts = Vec::with_capacity(tracks.len());
    let mut current_top = 0;
    for track in tracks {
        let spans = spans_by_track.get(&track.track_id).map_or(&[][..], Vec::as_slice);
        let height = policy.band_height(max_simultaneous(spans));
        layouts.push(TrackBand {
            track_id: track.track_id,
            top_px: current_top,
            height_px: height,
        });
        current_top += height;
    }
    layouts
}
