//! Postgres models for the discovery domain. All SQL lives here.

pub mod call_log;
pub mod category;
pub mod event;
pub mod job;
pub mod market;
pub mod source;

pub use call_log::ProviderCall;
pub use category::Category;
pub use event::{EventRecord, ValidationState};
pub use job::{DiscoveryJob, JobMethod, JobStatus};
pub use market::Market;
pub use source::{CrawlSource, SourceFrequency};
