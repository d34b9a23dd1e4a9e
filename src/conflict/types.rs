//! Flag types for the conflict and capacity scan.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Visual annotation flags a service can carry. Pair flags (conflict,
    /// proximity) and length flags are orthogonal sets; any combination is
    /// possible.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ServiceFlags: u8 {
        /// Hard overlap with a neighbor on the same sub-track
        const CONFLICTING = 1;
        /// Legal but operationally tight turnaround to a neighbor
        const PROXIMITY_WARNING = 1 << 1;
        /// Train longer than the signal-visible length
        const LENGTH_WARNING = 1 << 2;
        /// Train longer than the physical track
        const LENGTH_IMPOSSIBLE = 1 << 3;
    }
}

/// Tuning for the pair scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictConfig {
    /// Gap (minutes) at or below which adjacent services warn
    pub proximity_warning_minutes: i64,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            proximity_warning_minutes: crate::constants::DEFAULT_PROXIMITY_WARNING_MINUTES,
        }
    }
}
