/// Minutes in one schedule day
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Maximum number of retained history entries before the oldest are evicted
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// Gap (minutes) at or below which two adjacent services on the same sub-track
/// get a proximity warning
pub const DEFAULT_PROXIMITY_WARNING_MINUTES: i64 = 2;

/// Buffer after a delayed arrival before the track counts as free again
pub const DEFAULT_TURNAROUND_MINUTES: i64 = 10;

/// Extra buffer beyond turnaround before a neighbour counts as unaffected
pub const DEFAULT_CONFLICT_TOLERANCE_MINUTES: i64 = 5;

/// Delays at or below this magnitude (minutes) are not visualized at all
pub const DELAY_DISPLAY_THRESHOLD_MINUTES: i64 = 2;

/// Shortest service (minutes) that can still be split in two
pub const MIN_SPLIT_DURATION_MINUTES: i64 = 20;

/// Delay feed gives up after this many consecutive failed fetches
pub const MAX_FEED_RETRIES: u32 = 5;
