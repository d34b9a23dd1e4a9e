use crate::time::TimeSpan;

/// Sweep event ordering: on equal times a departure frees its slot before the
/// next arrival claims one, so a boundary handoff never inflates the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Depart,
    Arrive,
}

fn push_segment_events(events: &mut Vec<(i64, EventKind)>, start: i64, end: i64) {
    events.push((start, EventKind::Arrive));
    events.push((end, EventKind::Depart));
}

fn sweep(mut events: Vec<(i64, EventKind)>) -> usize {
    events.sort_unstable();

    let mut current: i64 = 0;
    let mut maximum: i64 = 0;
    for (_, kind) in events {
        match kind {
            EventKind::Arrive => {
                current += 1;
                maximum = maximum.max(current);
            }
            EventKind::Depart => current -= 1,
        }
    }

    #[allow(clippy::cast_sign_loss)]
    let maximum = maximum.max(0) as usize;
    maximum
}

/// Maximum number of spans open at any instant of the canonical day.
/// Zero spans need no sweep, and a single span is one by definition.
#[must_use]
pub fn max_simultaneous(spans: &[TimeSpan]) -> usize {
    if spans.len() <= 1 {
        return spans.len();
    }

    let mut events = Vec::with_capacity(spans.len() * 2);
    for span in spans {
        for (start, end) in span.segments() {
            push_segment_events(&mut events, start, end);
        }
    }
    sweep(events)
}

/// Maximum simultaneous count considering only the parts of each span that
/// fall inside `window`. Used to size a single service's stacking
/// neighborhood rather than the whole track.
#[must_use]
pub fn max_simultaneous_within(spans: &[TimeSpan], window: &TimeSpan) -> usize {
    let mut events = Vec::new();
    for span in spans {
        for (start, end) in span.segments() {
            for (window_start, window_end) in window.segments() {
                let clipped_start = start.max(window_start);
                let clipped_end = end.min(window_end);
                if clipped_start < clipped_end {
                    push_segment_events(&mut events, clipped_start, clipped_end);
                }
            }
        }
    }
    sweep(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn span(start: (u32, u32), end: (u32, u32)) -> TimeSpan {
        let arrival = NaiveTime::from_hms_opt(start.0, start.1, 0).expect("valid time");
        let departure = NaiveTime::from_hms_opt(end.0, end.1, 0).expect("valid time");
        TimeSpan::from_times(Some(arrival), Some(departure)).expect("span")
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(max_simultaneous(&[]), 0);
        assert_eq!(max_simultaneous(&[span((10, 0), (10, 30))]), 1);
    }

    #[test]
    fn test_chain_of_pairwise_overlaps() {
        // A 10:00-10:30, B 10:15-10:45, C 10:40-11:00: A/B and B/C overlap,
        // A/C do not, so the peak is two.
        let spans = vec![
            span((10, 0), (10, 30)),
            span((10, 15), (10, 45)),
            span((10, 40), (11, 0)),
        ];
        assert_eq!(max_simultaneous(&spans), 2);
    }

    #[test]
    fn test_three_way_overlap() {
        let spans = vec![
            span((9, 0), (10, 0)),
            span((9, 15), (9, 45)),
            span((9, 30), (9, 40)),
        ];
        assert_eq!(max_simultaneous(&spans), 3);
    }

    #[test]
    fn test_touching_boundary_does_not_stack() {
        let spans = vec![span((10, 0), (10, 30)), span((10, 30), (11, 0))];
        assert_eq!(max_simultaneous(&spans), 1);
    }

    #[test]
    fn test_midnight_spanning_counts_on_both_sides() {
        let spans = vec![span((23, 40), (0, 10)), span((0, 5), (0, 20))];
        assert_eq!(max_simultaneous(&spans), 2);
    }

    #[test]
    fn test_windowed_variant_clips() {
        let spans = vec![
            span((8, 0), (12, 0)),
            span((9, 0), (9, 30)),
            span((11, 0), (11, 30)),
        ];
        // Inside 9:00-10:00 only the long service and the 9:00 one coincide
        let window = span((9, 0), (10, 0));
        assert_eq!(max_simultaneous_within(&spans, &window), 2);
        // The full day sees the same peak of two
        assert_eq!(max_simultaneous(&spans), 2);
    }

    #[test]
    fn test_windowed_variant_empty_window_overlap() {
        let spans = vec![span((8, 0), (9, 0))];
        let window = span((10, 0), (11, 0));
        assert_eq!(max_simultaneous_within(&spans, &window), 0);
    }

    #[test]
    fn test_order_independence() {
        let mut spans = vec![
            span((10, 0), (10, 30)),
            span((10, 15), (10, 45)),
            span((10, 40), (11, 0)),
            span((10, 20), (10, 25)),
        ];
        let expected = max_simultaneous(&spans);
        spans.reverse();
        assert_eq!(max_simultaneous(&spans), expected);
        spans.swap(0, 2);
        assert_eq!(max_simultaneous(&spans), expected);
    }
}
