//! Acquisition-side provider traits.

use async_trait::async_trait;

use crate::error::AcquisitionError;
use crate::parse::RawCandidate;
use crate::providers::logger::CallMeta;

/// Answer from a web-search-backed completion call.
#[derive(Debug, Clone)]
pub struct SearchReply {
    /// Free text expected to contain a JSON array of candidate objects.
    pub text: String,
    pub meta: CallMeta,
}

/// Result of a structured event-extraction call over crawled page text.
#[derive(Debug, Clone)]
pub struct ExtractReply {
    pub events: Vec<RawCandidate>,
    /// Raw provider output kept for the job audit trail.
    pub raw: String,
    pub meta: CallMeta,
}

/// Provider that can answer a natural-language query with web search.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a web-search-backed completion.
    ///
    /// `recency_days` is a hint to prefer recently published sources.
    /// Network and provider-HTTP failures surface as [`AcquisitionError`],
    /// which is fatal to the calling job.
    async fn search(
        &self,
        query: &str,
        recency_days: Option<i64>,
    ) -> Result<SearchReply, AcquisitionError>;
}

/// Provider that extracts an `events` array from page text, constrained by
/// a JSON schema.
#[async_trait]
pub trait EventExtractor: Send + Sync {
    async fn extract_events(&self, prompt: &str) -> Result<ExtractReply, AcquisitionError>;
}
