use crate::constants::{
    DEFAULT_CONFLICT_TOLERANCE_MINUTES, DEFAULT_TURNAROUND_MINUTES, DELAY_DISPLAY_THRESHOLD_MINUTES,
    MINUTES_PER_DAY,
};
use crate::models::Service;
use crate::time::{minute_of_day, TimeSpan};
use serde::{Deserialize, Serialize};

/// Severity zone an affected neighbor falls into, ordered least to most
/// severe so `max` picks the worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Yellow,
    Orange,
    Red,
}

impl Zone {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Yellow => "yellow",
            Zone::Orange => "orange",
            Zone::Red => "red",
        }
    }
}

/// Buffers for the zone geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayZoneConfig {
    pub turnaround_minutes: i64,
    pub tolerance_minutes: i64,
    /// Delays at or below this magnitude are not classified at all
    pub display_threshold_minutes: i64,
}

impl Default for DelayZoneConfig {
    fn default() -> Self {
        Self {
            turnaround_minutes: DEFAULT_TURNAROUND_MINUTES,
            tolerance_minutes: DEFAULT_CONFLICT_TOLERANCE_MINUTES,
            display_threshold_minutes: DELAY_DISPLAY_THRESHOLD_MINUTES,
        }
    }
}

/// The three successive zones measured from the scheduled arrival: actual
/// delay, turnaround buffer, tolerance buffer. Zero-width zones are absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneSpans {
    pub red: Option<TimeSpan>,
    pub orange: Option<TimeSpan>,
    pub yellow: Option<TimeSpan>,
}

/// Zone geometry for a delay, in minutes from the scheduled arrival instant.
/// The overlay renderer turns these spans into pixels.
#[must_use]
pub fn zone_spans(
    scheduled_arrival_minute: i64,
    delay_minutes: i64,
    config: &DelayZoneConfig,
) -> ZoneSpans {
    let red_end = scheduled_arrival_minute + delay_minutes;
    let orange_end = red_end + config.turnaround_minutes;
    let yellow_end = orange_end + config.tolerance_minutes;

    let span = |start: i64, end: i64| {
        if end > start {
            Some(TimeSpan::new(start, end))
        } else {
            None
        }
    };

    ZoneSpans {
        red: span(scheduled_arrival_minute, red_end),
        orange: span(red_end, orange_end),
        yellow: span(orange_end, yellow_end),
    }
}

/// A neighbor overlapped by the delayed service's actual interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedService {
    pub service_id: u64,
    pub train_number: Option<String>,
    pub zone: Zone,
    pub overlap_minutes: i64,
}

/// Aggregate result of classifying one delayed service against its track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayAssessment {
    /// Worst zone across the affected services, none when nothing is touched
    pub severity: Option<Zone>,
    pub affected: Vec<AffectedService>,
}

impl DelayAssessment {
    #[must_use]
    pub fn has_conflict(&self) -> bool {
        !self.affected.is_empty()
    }
}

/// Actual (delay-shifted) occupation of the delayed service. Both endpoints
/// shift by the delay; a positive delay additionally holds the departure
/// until at least actual arrival plus turnaround.
fn actual_span(service: &Service, delay_minutes: i64, turnaround_minutes: i64) -> Option<TimeSpan> {
    let arrival = service.scheduled_arrival.map(minute_of_day);
    let mut departure = service.scheduled_departure.map(minute_of_day);
    if let (Some(arr), Some(dep)) = (arrival, departure) {
        if dep < arr {
            departure = Some(dep + MINUTES_PER_DAY);
        }
    }

    let actual_arrival = arrival.map(|m| m + delay_minutes);
    let mut actual_departure = departure.map(|m| m + delay_minutes);
    if let (Some(arr), Some(dep)) = (actual_arrival, actual_departure) {
        if delay_minutes > 0 {
            actual_departure = Some(dep.max(arr + turnaround_minutes));
        }
    }

    let start = actual_arrival.or(actual_departure)?;
    let end = actual_departure.or(actual_arrival)?;
    Some(TimeSpan::new(start, end.max(start)))
}

fn classify(span: &TimeSpan, zones: &ZoneSpans) -> Option<Zone> {
    if zones.red.is_some_and(|z| z.overlaps(span)) {
        Some(Zone::Red)
    } else if zones.orange.is_some_and(|z| z.overlaps(span)) {
        Some(Zone::Orange)
    } else if zones.yellow.is_some_and(|z| z.overlaps(span)) {
        Some(Zone::Yellow)
    } else {
        None
    }
}

/// Classify one delayed service against every other service on its track.
///
/// A neighbor overlapping the delayed service's actual interval is tagged
/// with the most severe zone its own interval touches; the aggregate
/// severity is the worst across all affected neighbors. Delays at or below
/// the display threshold produce no classification at all.
#[must_use]
pub fn assess_delay(
    delayed: &Service,
    delay_minutes: i64,
    services: &[Service],
    config: &DelayZoneConfig,
) -> DelayAssessment {
    if delay_minutes.abs() <= config.display_threshold_minutes {
        return DelayAssessment::default();
    }
    let Some(actual) = actual_span(delayed, delay_minutes, config.turnaround_minutes) else {
        return DelayAssessment::default();
    };
    let Some(arrival) = delayed.scheduled_arrival else {
        return DelayAssessment::default();
    };
    let zones = zone_spans(minute_of_day(arrival), delay_minutes, config);

    let mut assessment = DelayAssessment::default();
    for other in services {
        if other.id == delayed.id || other.track_id != delayed.track_id {
            continue;
        }
        let Some(span) = other.occupation() else {
            continue;
        };
        let overlap = actual.overlap_minutes(&span);
        if overlap <= 0 {
            continue;
        }
        let Some(zone) = classify(&span, &zones) else {
            continue;
        };
        assessment.affected.push(AffectedService {
            service_id: other.id,
            train_number: other.display_number().map(str::to_string),
            zone,
            overlap_minutes: overlap,
        });
        assessment.severity = assessment.severity.max(Some(zone));
    }
    assessment
}
