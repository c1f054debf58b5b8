//! Classification/validation provider trait.

use async_trait::async_trait;

use crate::error::ValidationProviderError;
use crate::providers::logger::CallMeta;
use crate::types::candidate::CandidateEvent;
use crate::types::validation::ValidationVerdict;

/// Domain context sent alongside each candidate.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub market_name: String,
    pub region: String,
    pub category: Option<String>,
    pub pillar: Option<String>,
}

/// One verdict from the classification provider.
#[derive(Debug, Clone)]
pub struct VerdictReply {
    pub verdict: ValidationVerdict,
    pub meta: CallMeta,
}

/// Provider that judges one candidate at a time.
///
/// Failures are per-item ([`ValidationProviderError`]) and never abort the
/// validation loop; the caller downgrades the affected item instead.
#[async_trait]
pub trait ValidationProvider: Send + Sync {
    async fn validate(
        &self,
        candidate: &CandidateEvent,
        context: &ValidationContext,
    ) -> Result<VerdictReply, ValidationProviderError>;
}
