//! Event discovery pipeline for Townbeat.
//!
//! This library holds the provider-facing and policy-heavy parts of the
//! discovery pipeline, with no database or HTTP-server dependency:
//!
//! - `strategy`: how candidates enter the pipeline (search vs. crawl)
//! - `validation`: per-candidate verdicts from the classification provider
//! - `dedup`: fingerprint + fuzzy-title duplicate policy over an [`store::EventStore`]
//! - `health`: crawl-source success/failure bookkeeping and due-date gating
//! - `providers`: external provider traits and the OpenAI-compatible client
//! - `fingerprint`, `similarity`, `parse`, `html`: the pure leaves
//!
//! The server crate supplies durable implementations of the storage and
//! audit-log seams and drives jobs through the stages in order.

pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod health;
pub mod html;
pub mod parse;
pub mod pipeline;
pub mod providers;
pub mod similarity;
pub mod store;
pub mod strategy;
pub mod testing;
pub mod types;
pub mod validation;

pub use dedup::{DedupEngine, InsertOutcome, FUZZY_DUPLICATE_THRESHOLD};
pub use error::{AcquisitionError, DiscoveryError, ValidationProviderError};
pub use health::{CrawlFrequency, CrawlOutcome, SourceHealth, AUTO_DISABLE_THRESHOLD};
pub use store::{EventStore, MemoryEventStore, StoredEvent};
pub use strategy::{Acquisition, AcquisitionStrategy, CrawlStrategy, SearchStrategy};
pub use types::candidate::CandidateEvent;
pub use types::context::{CategoryConfig, DateWindow, MarketConfig, SourceConfig};
pub use types::validation::{
    Recommendation, ValidationOutcome, ValidationStatus, ValidationVerdict,
};
pub use validation::ValidationStage;
