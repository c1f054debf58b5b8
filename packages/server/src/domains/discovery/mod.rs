//! Discovery domain: the job pipeline, its models, and its scheduling.

pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod store_bridge;
pub mod worker;

pub use orchestrator::Orchestrator;
pub use worker::{spawn_worker_pool, DiscoveryWorker};
