//! Write-only audit log for external provider calls.
//!
//! Every search, extraction, and validation call is recorded for
//! operability. The pipeline only ever writes these records; nothing in the
//! core logic reads them back.

use async_trait::async_trait;
use uuid::Uuid;

/// Max characters of request/response text kept per audit record.
pub const LOG_SNIPPET_MAX: usize = 2048;

/// Timing and usage metadata reported by a provider client for one call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallMeta {
    pub duration_ms: i64,
    pub total_tokens: Option<i64>,
}

/// One audit record per external call.
#[derive(Debug, Clone)]
pub struct ProviderCallRecord {
    pub provider: String,
    pub operation: String,
    pub duration_ms: i64,
    pub total_tokens: Option<i64>,
    pub success: bool,
    pub request_summary: String,
    pub response_summary: String,
    pub job_id: Option<Uuid>,
}

impl ProviderCallRecord {
    /// Build a record from a call's inputs and its observed metadata.
    pub fn new(
        provider: &str,
        operation: &str,
        request: &str,
        response: &str,
        meta: CallMeta,
        success: bool,
        job_id: Option<Uuid>,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            operation: operation.to_string(),
            duration_ms: meta.duration_ms,
            total_tokens: meta.total_tokens,
            success,
            request_summary: truncate_for_log(request),
            response_summary: truncate_for_log(response),
            job_id,
        }
    }
}

/// Sink for provider call records.
///
/// Implementations must absorb their own failures: audit logging never
/// interrupts the pipeline.
#[async_trait]
pub trait CallLogger: Send + Sync {
    async fn log_call(&self, record: ProviderCallRecord);
}

/// Logger that drops records; default for tests and library consumers that
/// don't persist an audit trail.
pub struct NoopCallLogger;

#[async_trait]
impl CallLogger for NoopCallLogger {
    async fn log_call(&self, record: ProviderCallRecord) {
        tracing::debug!(
            provider = %record.provider,
            operation = %record.operation,
            duration_ms = record.duration_ms,
            success = record.success,
            "provider call (not persisted)"
        );
    }
}

/// Truncate text to the audit snippet budget on a character boundary.
pub fn truncate_for_log(text: &str) -> String {
    if text.chars().count() <= LOG_SNIPPET_MAX {
        return text.to_string();
    }
    text.chars().take(LOG_SNIPPET_MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log() {
        let short = "hello";
        assert_eq!(truncate_for_log(short), "hello");

        let long = "x".repeat(LOG_SNIPPET_MAX + 100);
        assert_eq!(truncate_for_log(&long).chars().count(), LOG_SNIPPET_MAX);
    }
}
