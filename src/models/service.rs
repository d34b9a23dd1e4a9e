use crate::time::TimeSpan;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// One scheduled train movement occupying a track interval.
///
/// Field names follow the legacy save format so version-2 JSON exports load
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_train_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_train_number: Option<String>,
    #[serde(default, rename = "scheduledArrivalTime", with = "crate::time::hhmm_option")]
    pub scheduled_arrival: Option<NaiveTime>,
    #[serde(default, rename = "scheduledDepartureTime", with = "crate::time::hhmm_option")]
    pub scheduled_departure: Option<NaiveTime>,
    pub track_id: u32,
    #[serde(default)]
    pub sub_track_index: u32,
    #[serde(default)]
    pub train_set: TrainSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_history: Option<ConnectionHistory>,
}

impl Service {
    /// The interval this service occupies, if it has any scheduled time.
    /// A departure clock-time before the arrival is the midnight case.
    #[must_use]
    pub fn occupation(&self) -> Option<TimeSpan> {
        TimeSpan::from_times(self.scheduled_arrival, self.scheduled_departure)
    }

    /// Display number: arrival number first, then departure number
    #[must_use]
    pub fn display_number(&self) -> Option<&str> {
        self.arrival_train_number
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.departure_train_number.as_deref().filter(|n| !n.is_empty()))
    }

    #[must_use]
    pub fn spans_midnight(&self) -> bool {
        self.occupation().is_some_and(|span| span.spans_midnight())
    }
}

/// Vehicle composition of a service: an explicit list of vehicle types, or a
/// homogeneous unit with a count. The explicit list takes precedence when a
/// record carries both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrainSet {
    Composition {
        #[serde(rename = "customComposition")]
        vehicles: Vec<CompositionEntry>,
    },
    Unit {
        #[serde(rename = "vehicleTypeID")]
        vehicle_type_id: String,
        count: u32,
    },
}

impl Default for TrainSet {
    fn default() -> Self {
        TrainSet::Composition { vehicles: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionEntry {
    #[serde(rename = "vehicleTypeID")]
    pub vehicle_type_id: String,
}

/// Provenance record for a service produced by splitting another one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionHistory {
    #[serde(default)]
    pub original_service: OriginalNumbers,
    #[serde(default)]
    pub connected_to: Option<String>,
    pub split_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalNumbers {
    #[serde(default)]
    pub arrival_number: Option<String>,
    #[serde(default)]
    pub departure_number: Option<String>,
}
