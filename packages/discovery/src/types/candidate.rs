//! Candidate events: what acquisition produces and validation corrects.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event extracted from an external provider's response, before
/// validation. Immutable once stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Date text exactly as it appeared in the provider output.
    #[serde(default)]
    pub date_raw: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Page the candidate was discovered on, when known.
    #[serde(default)]
    pub source_url: Option<String>,
    /// Discovery job that produced this candidate.
    #[serde(skip)]
    pub job_id: Option<Uuid>,
}

impl CandidateEvent {
    /// Calendar day of the parsed start, if one was parsed.
    pub fn day(&self) -> Option<NaiveDate> {
        self.starts_at.map(|dt| dt.date_naive())
    }

    /// The date key used for fingerprinting: the parsed start date when
    /// available, otherwise the raw date text.
    pub fn date_key(&self) -> String {
        match self.day() {
            Some(day) => day.to_string(),
            None => self.date_raw.clone().unwrap_or_default(),
        }
    }
}

/// Drop candidates that cannot be validated or stored: no title, or a parsed
/// start date before the window start. Dropped items are filtered silently
/// and are not counted as found.
pub fn filter_candidates(
    candidates: Vec<CandidateEvent>,
    window_start: DateTime<Utc>,
) -> Vec<CandidateEvent> {
    candidates
        .into_iter()
        .filter(|c| {
            if c.title.trim().is_empty() {
                tracing::debug!("dropping candidate with no title");
                return false;
            }
            if let Some(starts_at) = c.starts_at {
                if starts_at < window_start {
                    tracing::debug!(title = %c.title, starts_at = %starts_at, "dropping candidate before window");
                    return false;
                }
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_filter_drops_missing_title() {
        let candidates = vec![
            CandidateEvent {
                title: "Sunset Yoga".into(),
                ..Default::default()
            },
            CandidateEvent {
                title: "   ".into(),
                ..Default::default()
            },
        ];
        let kept = filter_candidates(candidates, utc(2025, 6, 1));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Sunset Yoga");
    }

    #[test]
    fn test_filter_drops_dates_before_window() {
        let candidates = vec![
            CandidateEvent {
                title: "Past Event".into(),
                starts_at: Some(utc(2025, 5, 20)),
                ..Default::default()
            },
            CandidateEvent {
                title: "Future Event".into(),
                starts_at: Some(utc(2025, 6, 15)),
                ..Default::default()
            },
        ];
        let kept = filter_candidates(candidates, utc(2025, 6, 1));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Future Event");
    }

    #[test]
    fn test_filter_keeps_unparsed_dates() {
        // No parsed start: validation may still correct the date later.
        let candidates = vec![CandidateEvent {
            title: "Undated".into(),
            date_raw: Some("first Saturday in June".into()),
            ..Default::default()
        }];
        let kept = filter_candidates(candidates, utc(2025, 6, 1));
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_date_key_prefers_parsed_day() {
        let c = CandidateEvent {
            title: "Sunset Yoga".into(),
            date_raw: Some("June 1st, 2025".into()),
            starts_at: Some(utc(2025, 6, 1)),
            ..Default::default()
        };
        assert_eq!(c.date_key(), "2025-06-01");
    }
}
