use crate::constants::MINUTES_PER_DAY;
use chrono::{NaiveTime, Timelike};

/// Parse a wall-clock time string in HH:MM format
///
/// # Errors
///
/// Returns an error if the string is not a valid HH:MM time.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| format!("Invalid time '{s}': {e}"))
}

/// Format a time as HH:MM
#[must_use]
pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Minute-of-day for a wall-clock time (0..1439)
#[must_use]
pub fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Wall-clock time for a minute count; wraps past midnight
#[must_use]
pub fn time_at_minute(minute: i64) -> NaiveTime {
    let m = minute.rem_euclid(MINUTES_PER_DAY);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    NaiveTime::from_hms_opt((m / 60) as u32, (m % 60) as u32, 0).unwrap_or(NaiveTime::MIN)
}

/// Serde helper for `Option<NaiveTime>` fields stored as "HH:MM" strings.
/// Accepts null, a missing field, or an empty string as absent (legacy saves
/// use empty strings for cleared times).
pub mod hhmm_option {
    use super::{format_hhmm, parse_hhmm};
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// # Errors
    /// Never fails; absent values serialize as null.
    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&format_hhmm(*time)),
            None => serializer.serialize_none(),
        }
    }

    /// # Errors
    /// Fails if a present, non-empty string is not valid HH:MM.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_hhmm(&s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// A service's occupation interval on the circular schedule day.
///
/// `start` is a minute-of-day in `[0, 1440)`; `end` is at most one day later.
/// A departure clock-time numerically smaller than the arrival means the
/// service spans midnight and `end` lands past 1440.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    start: i64,
    end: i64,
}

impl TimeSpan {
    /// Build a span from raw minute bounds; the start is normalized into the
    /// canonical day and the duration is clamped to at most 24 hours.
    #[must_use]
    pub fn new(start_minute: i64, end_minute: i64) -> Self {
        let duration = (end_minute - start_minute).clamp(0, MINUTES_PER_DAY);
        let start = start_minute.rem_euclid(MINUTES_PER_DAY);
        Self {
            start,
            end: start + duration,
        }
    }

    /// Span for a service's scheduled times. A missing endpoint reuses the
    /// other one (zero-duration point); both missing means no span at all.
    #[must_use]
    pub fn from_times(arrival: Option<NaiveTime>, departure: Option<NaiveTime>) -> Option<Self> {
        let start_time = arrival.or(departure)?;
        let end_time = departure.or(arrival)?;
        let start = minute_of_day(start_time);
        let mut end = minute_of_day(end_time);
        if end < start {
            end += MINUTES_PER_DAY;
        }
        Some(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> i64 {
        self.end
    }

    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        self.end - self.start
    }

    #[must_use]
    pub fn spans_midnight(&self) -> bool {
        self.end > MINUTES_PER_DAY
    }

    /// Canonical-day pieces of the span, split at the midnight wrap.
    #[must_use]
    pub fn segments(&self) -> Vec<(i64, i64)> {
        if self.spans_midnight() {
            vec![(self.start, MINUTES_PER_DAY), (0, self.end - MINUTES_PER_DAY)]
        } else {
            vec![(self.start, self.end)]
        }
    }

    /// Total overlap with another span on the circular day, in minutes.
    /// Boundaries are exclusive: touching spans overlap by zero.
    #[must_use]
    pub fn overlap_minutes(&self, other: &Self) -> i64 {
        let mut total = 0;
        for shift in [-MINUTES_PER_DAY, 0, MINUTES_PER_DAY] {
            let lo = self.start.max(other.start + shift);
            let hi = self.end.min(other.end + shift);
            if hi > lo {
                total += hi - lo;
            }
        }
        total
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.overlap_minutes(other) > 0
    }

    /// Whether an instant falls strictly inside the span (circular)
    #[must_use]
    pub fn covers(&self, minute: i64) -> bool {
        let m = minute.rem_euclid(MINUTES_PER_DAY);
        (self.start < m && m < self.end)
            || (self.start < m + MINUTES_PER_DAY && m + MINUTES_PER_DAY < self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
    }

    #[test]
    fn test_parse_hhmm_valid() {
        assert_eq!(parse_hhmm("08:30").expect("should parse"), t(8, 30));
        assert_eq!(parse_hhmm("00:00").expect("should parse"), t(0, 0));
        assert_eq!(parse_hhmm("23:59").expect("should parse"), t(23, 59));
    }

    #[test]
    fn test_parse_hhmm_invalid() {
        assert!(parse_hhmm("25:00").is_err());
        assert!(parse_hhmm("12:60").is_err());
        assert!(parse_hhmm("noon").is_err());
        assert!(parse_hhmm("").is_err());
    }

    #[test]
    fn test_format_hhmm() {
        assert_eq!(format_hhmm(t(7, 5)), "07:05");
    }

    #[test]
    fn test_minute_of_day_round_trip() {
        assert_eq!(minute_of_day(t(10, 15)), 615);
        assert_eq!(time_at_minute(615), t(10, 15));
        assert_eq!(time_at_minute(1500), t(1, 0));
        assert_eq!(time_at_minute(-60), t(23, 0));
    }

    #[test]
    fn test_span_normal() {
        let span = TimeSpan::from_times(Some(t(10, 0)), Some(t(10, 30))).expect("span");
        assert_eq!(span.start(), 600);
        assert_eq!(span.end(), 630);
        assert_eq!(span.duration_minutes(), 30);
        assert!(!span.spans_midnight());
    }

    #[test]
    fn test_span_midnight_rollover() {
        let span = TimeSpan::from_times(Some(t(23, 40)), Some(t(0, 10))).expect("span");
        assert_eq!(span.start(), 1420);
        assert_eq!(span.end(), 1450);
        assert_eq!(span.duration_minutes(), 30);
        assert!(span.spans_midnight());
        assert_eq!(span.segments(), vec![(1420, 1440), (0, 10)]);
    }

    #[test]
    fn test_span_single_endpoint_is_point() {
        let span = TimeSpan::from_times(Some(t(9, 0)), None).expect("span");
        assert_eq!(span.duration_minutes(), 0);
        let other = TimeSpan::from_times(Some(t(8, 0)), Some(t(10, 0))).expect("span");
        assert!(!span.overlaps(&other));
    }

    #[test]
    fn test_span_no_times() {
        assert!(TimeSpan::from_times(None, None).is_none());
    }

    #[test]
    fn test_overlap_same_day() {
        let a = TimeSpan::from_times(Some(t(10, 0)), Some(t(10, 30))).expect("span");
        let b = TimeSpan::from_times(Some(t(10, 15)), Some(t(10, 45))).expect("span");
        assert_eq!(a.overlap_minutes(&b), 15);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_overlap_touching_is_not_overlapping() {
        let a = TimeSpan::from_times(Some(t(10, 0)), Some(t(10, 30))).expect("span");
        let b = TimeSpan::from_times(Some(t(10, 30)), Some(t(11, 0))).expect("span");
        assert_eq!(a.overlap_minutes(&b), 0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_overlap_across_midnight() {
        // 23:40-00:10 must overlap 00:05-00:20 by five minutes
        let late = TimeSpan::from_times(Some(t(23, 40)), Some(t(0, 10))).expect("span");
        let early = TimeSpan::from_times(Some(t(0, 5)), Some(t(0, 20))).expect("span");
        assert_eq!(late.overlap_minutes(&early), 5);
        assert!(early.overlaps(&late));
    }

    #[test]
    fn test_covers_is_exclusive_and_circular() {
        let span = TimeSpan::from_times(Some(t(23, 40)), Some(t(0, 10))).expect("span");
        assert!(span.covers(minute_of_day(t(23, 50))));
        assert!(span.covers(minute_of_day(t(0, 5))));
        assert!(!span.covers(minute_of_day(t(23, 40))));
        assert!(!span.covers(minute_of_day(t(0, 10))));
        assert!(!span.covers(minute_of_day(t(12, 0))));
    }
}
