//! Typed errors for the discovery pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell
//! stage-fatal failures apart from per-item failures.

use thiserror::Error;

/// Errors raised while acquiring candidates from an external provider.
///
/// Acquisition failures are fatal to the job that raised them: the
/// orchestrator records the message and marks the job failed. There is no
/// automatic retry; a re-run is a new job.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// HTTP transport failed (connect, timeout, TLS).
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Provider answered with a non-success HTTP status.
    #[error("provider HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    /// A crawl target could not be fetched. The caller records this against
    /// the source's health before propagating.
    #[error("source unreachable: {url}: {message}")]
    SourceUnreachable { url: String, message: String },
}

impl AcquisitionError {
    /// Whether this failure should count against crawl-source health.
    pub fn is_source_failure(&self) -> bool {
        matches!(self, AcquisitionError::SourceUnreachable { .. })
    }
}

/// Per-item failure of the classification provider.
///
/// Never fatal: the affected item is downgraded to needs_review with reduced
/// confidence and the validation loop continues.
#[derive(Debug, Error)]
#[error("validation provider error: {0}")]
pub struct ValidationProviderError(pub String);

/// Top-level error type for discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    ValidationProvider(#[from] ValidationProviderError),

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
