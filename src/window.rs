use chrono::{DateTime, Duration, Utc};

/// Selectable window widths, in hours
pub const VALID_RANGE_HOURS: [i64; 6] = [1, 3, 4, 6, 8, 12];

const DEFAULT_RANGE_HOURS: i64 = 4;
const DEFAULT_OFFSET_PERCENT: i64 = 20;
const DEFAULT_UPDATE_INTERVAL_SECS: u32 = 60;
const MAX_PAST_HOURS: i64 = 24;
const MAX_FUTURE_HOURS: i64 = 12;

/// Rendering hint for how a follow-mode recentering should be presented.
/// The window itself recomputes identically regardless of the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowStrategy {
    /// Drift under a minute: move silently
    Smooth,
    /// Visible drift: animate the move
    Animate,
    /// Large drift (user came back after a while): jump
    Jump,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowEventKind {
    NavigatedPrevious,
    NavigatedNext,
    JumpedToNow,
    RangeChanged { old_hours: i64, new_hours: i64 },
    FollowActivated,
    FollowDeactivated,
    FollowUpdated { strategy: FollowStrategy, drift_minutes: i64 },
    BoundaryRejected { message: String },
}

/// Snapshot of the window handed to listeners and the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    pub view_time: DateTime<Utc>,
    pub range_hours: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub following: bool,
    pub offset_percent: i64,
    pub update_interval_secs: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowEvent {
    pub kind: WindowEventKind,
    pub state: WindowState,
}

type Listener = Box<dyn Fn(&WindowEvent)>;

/// The visible time range: a center instant plus an enumerated width, with a
/// "now" marker pinned at a configurable offset from the left edge.
///
/// The current instant is always passed in by the caller; the model keeps no
/// ambient clock, which makes every operation deterministic under test.
pub struct TimeWindow {
    view_time: DateTime<Utc>,
    range_hours: i64,
    following: bool,
    offset_percent: i64,
    update_interval_secs: u32,
    listeners: Vec<Listener>,
}

impl TimeWindow {
    #[must_use]
    pub fn new(initial_view: DateTime<Utc>) -> Self {
        Self {
            view_time: initial_view,
            range_hours: DEFAULT_RANGE_HOURS,
            following: false,
            offset_percent: DEFAULT_OFFSET_PERCENT,
            update_interval_secs: DEFAULT_UPDATE_INTERVAL_SECS,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn view_time(&self) -> DateTime<Utc> {
        self.view_time
    }

    #[must_use]
    pub fn range_hours(&self) -> i64 {
        self.range_hours
    }

    #[must_use]
    pub fn is_following(&self) -> bool {
        self.following
    }

    #[must_use]
    pub fn update_interval_secs(&self) -> u32 {
        self.update_interval_secs
    }

    /// Visible range: the view time sits at the center
    #[must_use]
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let half = Duration::minutes(self.range_hours * 30);
        (self.view_time - half, self.view_time + half)
    }

    #[must_use]
    pub fn state(&self) -> WindowState {
        let (start_time, end_time) = self.window();
        WindowState {
            view_time: self.view_time,
            range_hours: self.range_hours,
            start_time,
            end_time,
            following: self.following,
            offset_percent: self.offset_percent,
            update_interval_secs: self.update_interval_secs,
        }
    }

    #[must_use]
    pub fn is_visible(&self, instant: DateTime<Utc>) -> bool {
        let (start, end) = self.window();
        instant >= start && instant <= end
    }

    pub fn add_listener(&mut self, listener: impl Fn(&WindowEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, kind: WindowEventKind) {
        let event = WindowEvent {
            kind,
            state: self.state(),
        };
        for listener in &self.listeners {
            listener(&event);
        }
    }

    /// Shift the window one full range into the past. Fails without mutating
    /// when that would land more than 24 h before `now`. Taking manual
    /// control drops follow mode.
    pub fn navigate_previous(&mut self, now: DateTime<Utc>) -> bool {
        let target = self.view_time - Duration::hours(self.range_hours);
        if target < now - Duration::hours(MAX_PAST_HOURS) {
            self.notify(WindowEventKind::BoundaryRejected {
                message: format!("Cannot go more than {MAX_PAST_HOURS} hours into the past"),
            });
            return false;
        }
        self.deactivate_follow();
        self.view_time = target;
        self.notify(WindowEventKind::NavigatedPrevious);
        true
    }

    /// Shift the window one full range into the future, bounded at 12 h
    /// ahead of `now`
    pub fn navigate_next(&mut self, now: DateTime<Utc>) -> bool {
        let target = self.view_time + Duration::hours(self.range_hours);
        if target > now + Duration::hours(MAX_FUTURE_HOURS) {
            self.notify(WindowEventKind::BoundaryRejected {
                message: format!("Cannot go more than {MAX_FUTURE_HOURS} hours into the future"),
            });
            return false;
        }
        self.deactivate_follow();
        self.view_time = target;
        self.notify(WindowEventKind::NavigatedNext);
        true
    }

    /// Where the view center must sit so that `now` lands at the configured
    /// offset fraction of the viewport instead of dead center
    fn offset_target(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let offset_from_center_minutes =
            (self.offset_percent - 50) * self.range_hours * 60 / 100;
        now - Duration::minutes(offset_from_center_minutes)
    }

    /// Recenter so the current instant sits at the offset marker
    pub fn jump_to_now(&mut self, now: DateTime<Utc>) {
        self.view_time = self.offset_target(now);
        self.notify(WindowEventKind::JumpedToNow);
    }

    /// Change the window width; only the enumerated values are accepted.
    /// The center stays put.
    pub fn set_range(&mut self, hours: i64) -> bool {
        if !VALID_RANGE_HOURS.contains(&hours) {
            self.notify(WindowEventKind::BoundaryRejected {
                message: format!("Invalid time range: {hours}h"),
            });
            return false;
        }
        let old_hours = self.range_hours;
        self.range_hours = hours;
        self.notify(WindowEventKind::RangeChanged {
            old_hours,
            new_hours: hours,
        });
        true
    }

    /// Offset of the "now" marker from the left edge, clamped to 0-50 %
    pub fn set_offset_percent(&mut self, percent: i64) {
        self.offset_percent = percent.clamp(0, 50);
    }

    pub fn set_update_interval_secs(&mut self, seconds: u32) {
        self.update_interval_secs = seconds.max(1);
    }

    pub fn activate_follow(&mut self, now: DateTime<Utc>) {
        if self.following {
            return;
        }
        self.jump_to_now(now);
        self.following = true;
        self.notify(WindowEventKind::FollowActivated);
    }

    pub fn deactivate_follow(&mut self) {
        if !self.following {
            return;
        }
        self.following = false;
        self.notify(WindowEventKind::FollowDeactivated);
    }

    pub fn toggle_follow(&mut self, now: DateTime<Utc>) -> bool {
        if self.following {
            self.deactivate_follow();
        } else {
            self.activate_follow(now);
        }
        self.following
    }

    /// Periodic follow-mode recentering. Classifies the drift since the last
    /// tick into a presentation strategy; the recomputation itself is always
    /// the same, and a second tick with the same `now` is a no-op drift of
    /// zero.
    pub fn follow_tick(&mut self, now: DateTime<Utc>) -> Option<FollowStrategy> {
        if !self.following {
            return None;
        }
        let target = self.offset_target(now);
        let drift_minutes = (target - self.view_time).num_minutes().abs();
        let strategy = if drift_minutes > 5 {
            FollowStrategy::Jump
        } else if drift_minutes > 1 {
            FollowStrategy::Animate
        } else {
            FollowStrategy::Smooth
        };
        self.view_time = target;
        self.notify(WindowEventKind::FollowUpdated {
            strategy,
            drift_minutes,
        });
        Some(strategy)
    }
}
