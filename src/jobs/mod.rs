//! Scheduled Jobs
//!
//! Background tasks of the service: the queue consumer slots (see
//! [`worker`]) and periodic maintenance checks that surface work the
//! pipeline cannot heal on its own.

pub mod worker;

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use uuid::Uuid;

use crate::domain::{MintRecord, MintStatus};
use crate::queue::{QueueError, SharedWorkQueue, WorkQueue};
use crate::store::{MintStore, SharedMintStore, StoreError};

pub use worker::{PollResult, QueueWorker, WorkerConfig};

/// Dead letters logged per check
const DEAD_LETTER_SAMPLE: u32 = 20;

/// Stale records reported per check
const STALE_PENDING_LIMIT: u32 = 100;

// =========================================================================
// Dead-letter check
// =========================================================================

/// Report messages sitting in the dead-letter channel.
/// Nothing is reprocessed; the messages wait for manual investigation.
pub async fn check_dead_letters(queue: &dyn WorkQueue) -> Result<u64, JobError> {
    let depth = queue.depth().await?;

    if depth.dead_lettered > 0 {
        for letter in queue.dead_letters(DEAD_LETTER_SAMPLE).await? {
            tracing::warn!(
                message_id = %letter.message_id,
                mint_id = %letter.attributes.mint_id,
                receive_count = letter.receive_count,
                dead_lettered_at = %letter.dead_lettered_at,
                "Message in dead-letter channel"
            );
        }
    }

    Ok(depth.dead_lettered)
}

// =========================================================================
// Orphaned PENDING check
// =========================================================================

/// Find PENDING records older than `older_than`.
///
/// A record stays PENDING when its notification was never published, so
/// these are reported rather than repaired.
pub async fn find_stale_pending(
    store: &dyn MintStore,
    older_than: Duration,
) -> Result<Vec<MintRecord>, JobError> {
    let window = chrono::Duration::from_std(older_than)
        .map_err(|e| JobError::InvalidWindow(e.to_string()))?;
    let cutoff = Utc::now() - window;

    let stale = store
        .find_stale(MintStatus::Pending, cutoff, STALE_PENDING_LIMIT)
        .await?;

    for record in &stale {
        tracing::warn!(
            mint_id = %record.mint_id,
            created_at = %record.created_at,
            "Mint stuck in PENDING, notification may never have been published"
        );
    }

    Ok(stale)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for the dead-letter check (default: 1 minute)
    pub dead_letter_check_interval: Duration,
    /// Interval for the stale PENDING check (default: 1 minute)
    pub stale_pending_check_interval: Duration,
    /// Age after which a PENDING record is reported (default: 10 minutes)
    pub stale_pending_after: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            dead_letter_check_interval: Duration::from_secs(60),
            stale_pending_check_interval: Duration::from_secs(60),
            stale_pending_after: Duration::from_secs(600),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    store: SharedMintStore,
    queue: SharedWorkQueue,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a new job scheduler
    pub fn new(store: SharedMintStore, queue: SharedWorkQueue) -> Self {
        Self::with_config(store, queue, JobSchedulerConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(
        store: SharedMintStore,
        queue: SharedWorkQueue,
        config: JobSchedulerConfig,
    ) -> Self {
        Self {
            store,
            queue,
            config,
        }
    }

    /// Start the job scheduler in the background.
    /// The task ends once `shutdown` turns true.
    pub fn start(self, shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Job scheduler started");

        let mut dead_letter_interval = interval(self.config.dead_letter_check_interval);
        let mut stale_pending_interval = interval(self.config.stale_pending_check_interval);

        loop {
            tokio::select! {
                _ = dead_letter_interval.tick() => {
                    if let Err(e) = check_dead_letters(self.queue.as_ref()).await {
                        tracing::error!(error = %e, "Dead-letter check failed");
                    }
                }
                _ = stale_pending_interval.tick() => {
                    if let Err(e) = find_stale_pending(self.store.as_ref(), self.config.stale_pending_after).await {
                        tracing::error!(error = %e, "Stale PENDING check failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Job scheduler stopped");
    }

    /// Run all maintenance jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match check_dead_letters(self.queue.as_ref()).await {
            Ok(count) => report.dead_lettered = count,
            Err(e) => report.errors.push(format!("Dead-letter check: {}", e)),
        }

        match find_stale_pending(self.store.as_ref(), self.config.stale_pending_after).await {
            Ok(records) => report.stale_pending = records.iter().map(|r| r.mint_id).collect(),
            Err(e) => report.errors.push(format!("Stale PENDING check: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running maintenance jobs
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub dead_lettered: u64,
    pub stale_pending: Vec<Uuid>,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Invalid time window: {0}")]
    InvalidWindow(String),
}

// =========================================================================
// Tests
// =========================================================================
