//! Validation verdicts and the acceptance policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::parse::parse_datetime;
use crate::types::candidate::CandidateEvent;

/// Confidence at or above which an `accept` recommendation is trusted.
pub const ACCEPT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Lifecycle status of a stored event with respect to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    #[default]
    Pending,
    Validated,
    Rejected,
    NeedsReview,
}

/// What the classification provider recommends for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    Reject,
    NeedsReview,
}

/// Field-level corrections to overlay on a candidate. Dates come back as
/// text and are re-parsed on application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Corrections {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub location_name: Option<String>,
    pub address: Option<String>,
    pub is_virtual: Option<bool>,
    pub cost: Option<String>,
}

/// Verdict returned by the classification provider for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    /// Confidence in [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub corrections: Corrections,
    pub recommendation: Recommendation,
}

impl ValidationVerdict {
    /// Storage status implied by this verdict: `reject` is absolute,
    /// `accept` is only trusted at or above the confidence threshold, and
    /// everything else lands in human review.
    pub fn storage_status(&self) -> ValidationStatus {
        match self.recommendation {
            Recommendation::Reject => ValidationStatus::Rejected,
            Recommendation::Accept if self.confidence >= ACCEPT_CONFIDENCE_THRESHOLD => {
                ValidationStatus::Validated
            }
            _ => ValidationStatus::NeedsReview,
        }
    }

    /// Overlay this verdict's corrections onto a candidate.
    pub fn apply_corrections(&self, mut candidate: CandidateEvent) -> CandidateEvent {
        let c = &self.corrections;
        if let Some(title) = &c.title {
            candidate.title = title.clone();
        }
        if let Some(description) = &c.description {
            candidate.description = description.clone();
        }
        if let Some(date) = &c.date {
            candidate.date_raw = Some(date.clone());
            if let Some(parsed) = parse_datetime(date) {
                candidate.starts_at = Some(parsed);
            }
        }
        if let Some(location_name) = &c.location_name {
            candidate.location_name = Some(location_name.clone());
        }
        if let Some(address) = &c.address {
            candidate.address = Some(address.clone());
        }
        if let Some(is_virtual) = c.is_virtual {
            candidate.is_virtual = is_virtual;
        }
        if let Some(cost) = &c.cost {
            candidate.cost = Some(cost.clone());
        }
        candidate
    }
}

/// One validation outcome per input candidate.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Original candidate with corrections overlaid.
    pub corrected: CandidateEvent,
    pub verdict: ValidationVerdict,
    /// Policy-applied storage status.
    pub status: ValidationStatus,
    /// Reviewer-facing note (issue list, degraded-validation explanation).
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(recommendation: Recommendation, confidence: f64) -> ValidationVerdict {
        ValidationVerdict {
            is_valid: true,
            confidence,
            issues: vec![],
            corrections: Corrections::default(),
            recommendation,
        }
    }

    #[test]
    fn test_accept_above_threshold_is_validated() {
        assert_eq!(
            verdict(Recommendation::Accept, 0.9).storage_status(),
            ValidationStatus::Validated
        );
        assert_eq!(
            verdict(Recommendation::Accept, 0.7).storage_status(),
            ValidationStatus::Validated
        );
    }

    #[test]
    fn test_accept_below_threshold_needs_review() {
        assert_eq!(
            verdict(Recommendation::Accept, 0.69).storage_status(),
            ValidationStatus::NeedsReview
        );
    }

    #[test]
    fn test_reject_is_absolute() {
        // Even at full confidence a reject stays rejected.
        assert_eq!(
            verdict(Recommendation::Reject, 1.0).storage_status(),
            ValidationStatus::Rejected
        );
    }

    #[test]
    fn test_needs_review_recommendation() {
        assert_eq!(
            verdict(Recommendation::NeedsReview, 0.95).storage_status(),
            ValidationStatus::NeedsReview
        );
    }

    #[test]
    fn test_apply_corrections_overlays_fields() {
        let mut v = verdict(Recommendation::Accept, 0.9);
        v.corrections.title = Some("Sunset Yoga in the Park".into());
        v.corrections.date = Some("2025-06-02".into());

        let corrected = v.apply_corrections(CandidateEvent {
            title: "Sunset Yoga".into(),
            ..Default::default()
        });
        assert_eq!(corrected.title, "Sunset Yoga in the Park");
        assert_eq!(corrected.date_key(), "2025-06-02");
    }

    #[test]
    fn test_apply_corrections_keeps_unmentioned_fields() {
        let v = verdict(Recommendation::Accept, 0.9);
        let corrected = v.apply_corrections(CandidateEvent {
            title: "Sunset Yoga".into(),
            location_name: Some("City Park".into()),
            ..Default::default()
        });
        assert_eq!(corrected.title, "Sunset Yoga");
        assert_eq!(corrected.location_name.as_deref(), Some("City Park"));
    }
}
