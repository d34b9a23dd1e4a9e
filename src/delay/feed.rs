use crate::constants::MAX_FEED_RETRIES;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One per-train delay record from the external feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayRecord {
    pub train_number: String,
    #[serde(default)]
    pub delay_minutes: i64,
    #[serde(default)]
    pub delay_status: Option<String>,
    #[serde(default)]
    pub is_canceled: bool,
    #[serde(default)]
    pub is_replaced: bool,
    #[serde(default)]
    pub deviation_description: Option<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub advertised_time: Option<String>,
}

/// Canonical train-number form, applied at every insert and lookup.
/// Trims whitespace and strips leading zeros from purely numeric numbers so
/// "0424", " 424" and 424 all resolve to the same record.
#[must_use]
pub fn normalize_train_number(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

/// Last-known delay data, keyed by normalized train number. Absence of data
/// is an ordinary state; consumers always work with whatever is here.
#[derive(Debug, Clone, Default)]
pub struct DelayDataset {
    records: IndexMap<String, DelayRecord>,
    last_updated: Option<DateTime<Utc>>,
}

impl DelayDataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole dataset with a fresh feed response
    pub fn replace_all(&mut self, records: Vec<DelayRecord>, now: DateTime<Utc>) {
        self.records.clear();
        for record in records {
            if record.train_number.trim().is_empty() {
                log::warn!("delay record without train number skipped");
                continue;
            }
            let key = normalize_train_number(&record.train_number);
            self.records.insert(key, record);
        }
        self.last_updated = Some(now);
        log::info!("delay dataset updated: {} trains", self.records.len());
    }

    #[must_use]
    pub fn get(&self, train_number: &str) -> Option<&DelayRecord> {
        self.records.get(&normalize_train_number(train_number))
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Exponential backoff before retry `attempt` (1-based), capped at 30 s
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    let seconds = 2u64.saturating_pow(attempt).min(30);
    Duration::from_secs(seconds)
}

/// Connection state of the feed client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No fetch attempted yet
    Idle,
    /// Last fetch succeeded
    Connected,
    /// Last fetch failed; a retry is due after `backoff_delay(attempt)`
    Retrying { attempt: u32 },
    /// Retry budget exhausted; the dataset stays as-is until a manual refresh
    Disconnected,
}

/// HTTP client for the delay feed. The caller owns scheduling: after a
/// failed `fetch`, `retry_backoff` says how long to wait before calling
/// again, until the retry budget runs out.
pub struct FeedClient {
    url: String,
    http: reqwest::Client,
    state: FeedState,
    attempts: u32,
}

impl FeedClient {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            state: FeedState::Idle,
            attempts: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> FeedState {
        self.state
    }

    /// Delay before the next retry, while retries remain
    #[must_use]
    pub fn retry_backoff(&self) -> Option<Duration> {
        match self.state {
            FeedState::Retrying { attempt } => Some(backoff_delay(attempt)),
            _ => None,
        }
    }

    /// Reset the retry budget, e.g. for a user-triggered refresh
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.state = FeedState::Idle;
    }

    /// Fetch the feed once and parse the JSON record array.
    ///
    /// # Errors
    ///
    /// Returns the failure description; the client moves to `Retrying` or,
    /// after the retry budget is spent, `Disconnected`.
    pub async fn fetch(&mut self) -> Result<Vec<DelayRecord>, String> {
        let response = match self.http.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => return Err(self.note_failure(format!("delay feed request failed: {e}"))),
        };
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => return Err(self.note_failure(format!("delay feed returned error: {e}"))),
        };
        match response.json::<Vec<DelayRecord>>().await {
            Ok(records) => {
                self.attempts = 0;
                self.state = FeedState::Connected;
                Ok(records)
            }
            Err(e) => Err(self.note_failure(format!("delay feed payload invalid: {e}"))),
        }
    }

    fn note_failure(&mut self, message: String) -> String {
        self.attempts += 1;
        if self.attempts >= MAX_FEED_RETRIES {
            self.state = FeedState::Disconnected;
            log::warn!("{message}; giving up after {} attempts", self.attempts);
        } else {
            self.state = FeedState::Retrying { attempt: self.attempts };
            log::warn!(
                "{message}; retry {} in {:?}",
                self.attempts,
                backoff_delay(self.attempts)
            );
        }
        message
    }
}
