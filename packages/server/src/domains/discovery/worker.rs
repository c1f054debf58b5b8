//! Polling discovery workers.
//!
//! Each worker claims one due pending job at a time and runs it to its
//! terminal state through the orchestrator. A job is one sequential unit of
//! work with no intra-job parallelism; cross-job concurrency comes from the
//! pool size, and the only admission bound is the stagger applied at
//! enqueue time. Shutdown is honored between jobs, never mid-job: there is
//! no cancellation for an in-flight job.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::kernel::ServerKernel;

use super::models::DiscoveryJob;
use super::orchestrator::Orchestrator;

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How long to wait after an empty poll.
    pub idle_poll_interval: Duration,
    /// How long to back off after a claim error.
    pub error_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval: Duration::from_secs(5),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// One polling worker.
pub struct DiscoveryWorker {
    kernel: Arc<ServerKernel>,
    worker_id: String,
    config: WorkerConfig,
}

impl DiscoveryWorker {
    pub fn new(kernel: Arc<ServerKernel>, index: usize) -> Self {
        Self {
            kernel,
            worker_id: format!("worker-{index}-{}", Uuid::new_v4()),
            config: WorkerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Poll-claim-run loop until shutdown.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(worker_id = %self.worker_id, "discovery worker starting");
        let orchestrator = Orchestrator::new(Arc::clone(&self.kernel));

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            match DiscoveryJob::claim_due(&self.worker_id, &self.kernel.db_connection).await {
                Ok(Some(job)) => {
                    // Once claimed, the job runs to completed or failed.
                    orchestrator.run(job).await;
                }
                Ok(None) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.idle_poll_interval) => {}
                    }
                }
                Err(e) => {
                    tracing::error!(worker_id = %self.worker_id, error = %e, "failed to claim job");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.error_backoff) => {}
                    }
                }
            }
        }

        tracing::info!(worker_id = %self.worker_id, "discovery worker stopped");
    }
}

/// Spawn the configured number of workers.
pub fn spawn_worker_pool(
    kernel: Arc<ServerKernel>,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let count = kernel.config.worker_count.max(1);
    (0..count)
        .map(|index| {
            let worker = DiscoveryWorker::new(Arc::clone(&kernel), index);
            let token = shutdown.clone();
            tokio::spawn(worker.run(token))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_ids_are_unique() {
        // Worker ids distinguish claimants in the jobs table.
        let config = WorkerConfig::default();
        assert!(config.idle_poll_interval > Duration::ZERO);

        let a = format!("worker-0-{}", Uuid::new_v4());
        let b = format!("worker-0-{}", Uuid::new_v4());
        assert_ne!(a, b);
    }
}
