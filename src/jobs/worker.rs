//! Queue Worker
//!
//! Consumer slots that pull deliveries from the work queue and hand them
//! to the processing handler. A delivery is acknowledged only when
//! processing succeeds; otherwise it stays on the queue and is redelivered
//! after the visibility timeout.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::handlers::{ProcessMintHandler, ProcessOutcome};
use crate::queue::{QueueError, SharedWorkQueue};

/// Deliveries requested per receive; the processing handler accepts
/// exactly one per invocation
const DELIVERIES_PER_RECEIVE: usize = 1;

/// Configuration for queue workers
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of independent consumer slots (default: 2)
    pub concurrency: usize,
    /// Pause after an empty receive (default: 500ms)
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// Nothing was visible
    Idle,
    /// Processing succeeded; `acked` is false when the receipt had gone stale
    Processed { outcome: ProcessOutcome, acked: bool },
    /// Processing failed; the delivery was left for redelivery
    Failed,
}

/// Queue consumer
#[derive(Clone)]
pub struct QueueWorker {
    queue: SharedWorkQueue,
    handler: Arc<ProcessMintHandler>,
    config: WorkerConfig,
}

impl QueueWorker {
    pub fn new(queue: SharedWorkQueue, handler: Arc<ProcessMintHandler>) -> Self {
        Self::with_config(queue, handler, WorkerConfig::default())
    }

    pub fn with_config(
        queue: SharedWorkQueue,
        handler: Arc<ProcessMintHandler>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Spawn the consumer slots.
    ///
    /// Each slot stops once `shutdown` turns true; a delivery already being
    /// processed is finished first.
    pub fn start(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        (0..self.config.concurrency.max(1))
            .map(|slot| {
                let worker = self.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    worker.run(slot, shutdown).await;
                })
            })
            .collect()
    }

    async fn run(&self, slot: usize, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(slot = slot, "Queue worker started");

        loop {
            let stopping = *shutdown.borrow();
            if stopping {
                break;
            }

            let pause = match self.poll_once().await {
                Ok(PollResult::Idle) => true,
                Ok(_) => false,
                Err(e) => {
                    tracing::error!(slot = slot, error = %e, "Queue receive failed");
                    true
                }
            };

            if pause {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.poll_interval) => {}
                    _ = shutdown.changed() => {}
                }
            }
        }

        tracing::info!(slot = slot, "Queue worker stopped");
    }

    /// Receive one batch and process it
    pub async fn poll_once(&self) -> Result<PollResult, QueueError> {
        let deliveries = self.queue.receive(DELIVERIES_PER_RECEIVE).await?;
        if deliveries.is_empty() {
            return Ok(PollResult::Idle);
        }

        match self.handler.handle_batch(&deliveries).await {
            Ok(outcome) => {
                let mut acked = true;
                for delivery in &deliveries {
                    if !self.queue.ack(&delivery.receipt).await? {
                        tracing::warn!(
                            message_id = %delivery.message_id(),
                            "Receipt went stale before acknowledgement"
                        );
                        acked = false;
                    }
                }
                Ok(PollResult::Processed { outcome, acked })
            }
            Err(e) => {
                for delivery in &deliveries {
                    tracing::warn!(
                        message_id = %delivery.message_id(),
                        receive_count = delivery.receive_count(),
                        transient = e.is_transient(),
                        "Delivery left for redelivery"
                    );
                }
                Ok(PollResult::Failed)
            }
        }
    }
}
