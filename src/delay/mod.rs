//! Delay data feed and delay-impact classification.
//!
//! The feed is a data source only: fetch failures degrade to stale or absent
//! delay data and never reach the layout engines.

mod feed;
mod zones;

pub use feed::{
    backoff_delay, normalize_train_number, DelayDataset, DelayRecord, FeedClient, FeedState,
};
pub use zones::{
    assess_delay, zone_spans, AffectedService, DelayAssessment, DelayZoneConfig, Zone, ZoneSpans,
};
