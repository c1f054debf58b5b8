//! Crawl-source health rules.
//!
//! Pure bookkeeping over a source's health view; the server persists the
//! mutated view after each crawl attempt. A source that fails enough times
//! in a row disables itself and stays disabled until a human re-enables it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Consecutive failures at which a source is automatically disabled.
pub const AUTO_DISABLE_THRESHOLD: i32 = 5;

/// How often a source should be crawled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlFrequency {
    Daily,
    TwiceWeekly,
    Weekly,
}

impl CrawlFrequency {
    /// Minimum elapsed time before the next crawl is due.
    pub fn interval(&self) -> Duration {
        match self {
            CrawlFrequency::Daily => Duration::hours(24),
            CrawlFrequency::TwiceWeekly => Duration::hours(84),
            CrawlFrequency::Weekly => Duration::hours(168),
        }
    }
}

/// Result of one crawl attempt against a source.
#[derive(Debug, Clone)]
pub enum CrawlOutcome {
    /// The crawl ran and found events.
    Success { events_found: i64 },
    /// The crawl ran but the page yielded nothing; not an error.
    NoEvents,
    /// The source could not be fetched or the provider failed.
    Error { message: String },
}

/// Mutable health view of a crawl source.
#[derive(Debug, Clone)]
pub struct SourceHealth {
    pub active: bool,
    pub consecutive_failures: i32,
    pub frequency: CrawlFrequency,
    pub last_crawl_at: Option<DateTime<Utc>>,
    pub last_crawl_status: Option<String>,
    pub last_error: Option<String>,
    pub last_events_found: i64,
    pub total_events_found: i64,
}

impl SourceHealth {
    /// Fresh health for a newly configured source.
    pub fn new(frequency: CrawlFrequency) -> Self {
        Self {
            active: true,
            consecutive_failures: 0,
            frequency,
            last_crawl_at: None,
            last_crawl_status: None,
            last_error: None,
            last_events_found: 0,
            total_events_found: 0,
        }
    }

    /// Apply one crawl outcome.
    ///
    /// Success and no-events reset the failure streak; an error increments
    /// it and disables the source at [`AUTO_DISABLE_THRESHOLD`]. Disabled
    /// sources must be manually re-enabled.
    pub fn record_outcome(&mut self, outcome: &CrawlOutcome, now: DateTime<Utc>) {
        self.last_crawl_at = Some(now);
        match outcome {
            CrawlOutcome::Success { events_found } => {
                self.consecutive_failures = 0;
                self.last_crawl_status = Some("success".to_string());
                self.last_error = None;
                self.last_events_found = *events_found;
                self.total_events_found += events_found;
            }
            CrawlOutcome::NoEvents => {
                self.consecutive_failures = 0;
                self.last_crawl_status = Some("no_events".to_string());
                self.last_error = None;
                self.last_events_found = 0;
            }
            CrawlOutcome::Error { message } => {
                self.consecutive_failures += 1;
                self.last_crawl_status = Some("error".to_string());
                self.last_error = Some(message.clone());
                self.last_events_found = 0;
                if self.consecutive_failures >= AUTO_DISABLE_THRESHOLD {
                    tracing::warn!(
                        failures = self.consecutive_failures,
                        "source auto-disabled after repeated crawl failures"
                    );
                    self.active = false;
                }
            }
        }
    }

    /// Whether the source is due for another crawl: never crawled, or past
    /// the interval for its frequency class.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_crawl_at {
            None => true,
            Some(last) => now - last > self.frequency.interval(),
        }
    }
}
