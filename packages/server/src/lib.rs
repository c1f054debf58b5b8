//! Townbeat server: durable state and execution for the discovery pipeline.
//!
//! The `discovery` crate holds the pipeline logic; this crate supplies the
//! Postgres models, the job orchestrator and worker pool, the batch
//! scheduler, and the collaborator HTTP surface.

pub mod domains;
pub mod kernel;
pub mod server;

pub use kernel::config::ServerConfig;
pub use kernel::ServerKernel;
