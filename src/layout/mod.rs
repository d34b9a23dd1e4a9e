//! Track occupancy analysis and stacked-bar layout.
//!
//! Raw services flow through the occupancy sweep (per track), the gravity
//! slot assigner, and finally the band calculator, producing the pixel
//! geometry the renderer consumes. Everything here is a pure function of its
//! inputs and is recomputed on every render pass.

mod bands;
mod occupancy;
mod slots;

pub use bands::{track_layouts, HeightPolicy, TrackBand};
pub use occupancy::{max_simultaneous, max_simultaneous_within};
pub use slots::{assign_lanes, SlotAssignment};

use crate::models::Service;
use crate::time::TimeSpan;

/// Occupation spans for a slice of services, skipping services with no
/// scheduled time at all.
#[must_use]
pub fn service_spans(services: &[Service]) -> Vec<TimeSpan> {
    services.iter().filter_map(Service::occupation).collect()
}

/// Maximum number of services simultaneously present on one track
#[must_use]
pub fn track_max_simultaneous(services: &[Service]) -> usize {
    max_simultaneous(&service_spans(services))
}
