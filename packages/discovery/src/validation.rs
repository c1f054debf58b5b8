//! Candidate validation against the classification provider.
//!
//! One provider call per candidate, spaced by a fixed sleep to respect the
//! provider's rate limit. A per-item provider failure never aborts the
//! loop: the item is downgraded to needs_review at reduced confidence with
//! an explanatory note.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::providers::logger::{CallLogger, CallMeta, ProviderCallRecord};
use crate::providers::validator::{ValidationContext, ValidationProvider};
use crate::types::candidate::CandidateEvent;
use crate::types::validation::{
    Corrections, Recommendation, ValidationOutcome, ValidationStatus, ValidationVerdict,
};

/// Fixed sleep between provider calls. A plain delay, not a token bucket.
pub const INTER_ITEM_DELAY: Duration = Duration::from_millis(500);

/// Confidence assigned to items whose validation call failed.
pub const DEGRADED_CONFIDENCE: f64 = 0.5;

/// Runs candidates through the classification provider one at a time.
pub struct ValidationStage {
    provider: Arc<dyn ValidationProvider>,
    logger: Arc<dyn CallLogger>,
    delay: Duration,
}

impl ValidationStage {
    pub fn new(provider: Arc<dyn ValidationProvider>, logger: Arc<dyn CallLogger>) -> Self {
        Self {
            provider,
            logger,
            delay: INTER_ITEM_DELAY,
        }
    }

    /// Override the inter-item delay (tests use zero).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Validate candidates in order, one result per input.
    ///
    /// Never fails as a whole: provider errors degrade the affected item and
    /// the loop continues.
    pub async fn validate(
        &self,
        candidates: Vec<CandidateEvent>,
        context: &ValidationContext,
        job_id: Option<Uuid>,
    ) -> Vec<ValidationOutcome> {
        let mut outcomes = Vec::with_capacity(candidates.len());

        for (index, candidate) in candidates.into_iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let outcome = match self.provider.validate(&candidate, context).await {
                Ok(reply) => {
                    self.logger
                        .log_call(ProviderCallRecord::new(
                            "validation",
                            "validate_candidate",
                            &candidate.title,
                            &format!("{:?}", reply.verdict.recommendation),
                            reply.meta,
                            true,
                            job_id,
                        ))
                        .await;

                    let status = reply.verdict.storage_status();
                    let note = if reply.verdict.issues.is_empty() {
                        None
                    } else {
                        Some(reply.verdict.issues.join("; "))
                    };
                    ValidationOutcome {
                        corrected: reply.verdict.apply_corrections(candidate),
                        verdict: reply.verdict,
                        status,
                        note,
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        title = %candidate.title,
                        error = %e,
                        "validation call failed, downgrading item to needs_review"
                    );
                    self.logger
                        .log_call(ProviderCallRecord::new(
                            "validation",
                            "validate_candidate",
                            &candidate.title,
                            &e.to_string(),
                            CallMeta::default(),
                            false,
                            job_id,
                        ))
                        .await;

                    degraded_outcome(candidate, &e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

/// Outcome for an item whose validation call failed: needs_review at
/// [`DEGRADED_CONFIDENCE`], original fields untouched.
fn degraded_outcome(candidate: CandidateEvent, error: &str) -> ValidationOutcome {
    let note = format!("validation unavailable: {error}");
    ValidationOutcome {
        corrected: candidate,
        verdict: ValidationVerdict {
            is_valid: false,
            confidence: DEGRADED_CONFIDENCE,
            issues: vec![note.clone()],
            corrections: Corrections::default(),
            recommendation: Recommendation::NeedsReview,
        },
        status: ValidationStatus::NeedsReview,
        note: Some(note),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationProviderError;
    use crate::providers::logger::NoopCallLogger;
    use crate::testing::MockValidationProvider;

    fn candidate(title: &str) -> CandidateEvent {
        CandidateEvent {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_one_outcome_per_input() {
        let provider = Arc::new(MockValidationProvider::new());
        let stage = ValidationStage::new(provider, Arc::new(NoopCallLogger))
            .with_delay(Duration::ZERO);

        let outcomes = stage
            .validate(
                vec![candidate("A"), candidate("B"), candidate("C")],
                &ValidationContext::default(),
                None,
            )
            .await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes
            .iter()
            .all(|o| o.status == ValidationStatus::Validated));
    }

    #[tokio::test]
    async fn test_provider_error_downgrades_item_and_continues() {
        let provider = Arc::new(MockValidationProvider::new().with_results(vec![
            Ok(MockValidationProvider::accept(0.9)),
            Err(ValidationProviderError("HTTP 500".into())),
            Ok(MockValidationProvider::accept(0.8)),
        ]));
        let stage = ValidationStage::new(provider, Arc::new(NoopCallLogger))
            .with_delay(Duration::ZERO);

        let outcomes = stage
            .validate(
                vec![candidate("A"), candidate("B"), candidate("C")],
                &ValidationContext::default(),
                None,
            )
            .await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, ValidationStatus::Validated);
        assert_eq!(outcomes[1].status, ValidationStatus::NeedsReview);
        assert!((outcomes[1].verdict.confidence - DEGRADED_CONFIDENCE).abs() < 1e-9);
        assert!(outcomes[1]
            .note
            .as_deref()
            .unwrap()
            .contains("validation unavailable"));
        assert_eq!(outcomes[2].status, ValidationStatus::Validated);
    }

    #[tokio::test]
    async fn test_degraded_item_is_never_rejected() {
        let provider = Arc::new(
            MockValidationProvider::new()
                .with_results(vec![Err(ValidationProviderError("timeout".into()))]),
        );
        let stage = ValidationStage::new(provider, Arc::new(NoopCallLogger))
            .with_delay(Duration::ZERO);

        let outcomes = stage
            .validate(vec![candidate("A")], &ValidationContext::default(), None)
            .await;
        assert_ne!(outcomes[0].status, ValidationStatus::Rejected);
    }
}
