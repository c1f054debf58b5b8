//! Acquisition strategies: how candidates enter the pipeline.
//!
//! Two interchangeable strategies feed the pipeline. [`SearchStrategy`]
//! queries a web-search-capable provider with an assembled natural-language
//! query; [`CrawlStrategy`] fetches a configured page and has the provider
//! extract events from its readable text. Both fail the whole job on
//! network/provider errors and silently filter malformed candidates.

mod crawl;
mod search;

pub use crawl::{build_extraction_prompt, CrawlStrategy};
pub use search::{build_search_query, SearchStrategy};

use async_trait::async_trait;

use crate::error::AcquisitionError;
use crate::types::candidate::CandidateEvent;
use crate::types::context::{DateWindow, MarketConfig};

/// What a strategy produced, kept on the job for audit.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub candidates: Vec<CandidateEvent>,
    /// Exact prompt/query sent to the provider.
    pub query: String,
    /// Raw provider response.
    pub raw_response: String,
}

/// Common contract for acquisition strategies.
///
/// An [`AcquisitionError`] from `acquire` is fatal to the calling job: the
/// orchestrator records the message and marks the job failed, with no
/// automatic retry.
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    /// Tag used in logs and call-audit records.
    fn method(&self) -> &'static str;

    async fn acquire(
        &self,
        market: &MarketConfig,
        window: DateWindow,
    ) -> Result<Acquisition, AcquisitionError>;
}
