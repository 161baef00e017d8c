//! Process Handler
//!
//! Consumes one "mint created" notification and drives the record through
//! PENDING → PROCESSING → (COMPLETED | FAILED) around a single settlement
//! call.

use std::time::Duration;
use uuid::Uuid;

use crate::domain::{MintStatus, StatusUpdate};
use crate::queue::{Delivery, MintCreatedMessage, MINT_CREATED};
use crate::settlement::{SettlementError, SettlementOutcome, SharedSettlementClient};
use crate::store::{SharedMintStore, StoreError, UpdateOutcome};

/// Processing errors
///
/// Any error leaves the delivery unacknowledged, so the queue redelivers it
/// until the receive limit moves it to the dead-letter channel.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Mint not found: {0}")]
    NotFound(Uuid),

    #[error("Expected exactly 1 message per invocation, got {0}")]
    BatchSize(usize),

    #[error("Malformed queue message: {0}")]
    MalformedMessage(String),

    #[error("Mint {mint_id} is {current}, cannot move to {attempted}")]
    UnexpectedStatus {
        mint_id: Uuid,
        current: MintStatus,
        attempted: MintStatus,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Mint {mint_id} failed processing: {reason}")]
    SettlementRejected { mint_id: Uuid, reason: String },
}

impl ProcessError {
    /// Whether the record still needs a FAILED write for this error.
    ///
    /// A rejected settlement is already recorded with the service's reason,
    /// and the remaining variants never reached a record.
    fn needs_failure_record(&self) -> bool {
        matches!(
            self,
            ProcessError::Store(_)
                | ProcessError::Settlement(_)
                | ProcessError::UnexpectedStatus { .. }
        )
    }

    /// Whether a redelivery of the same message may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProcessError::Store(e) => e.is_retryable(),
            ProcessError::Settlement(_) | ProcessError::SettlementRejected { .. } => true,
            ProcessError::NotFound(_)
            | ProcessError::BatchSize(_)
            | ProcessError::MalformedMessage(_)
            | ProcessError::UnexpectedStatus { .. } => false,
        }
    }
}

/// Upper bound on one settlement call unless configured otherwise
const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful end of one processing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed { transaction_id: String },
    /// Another delivery already settled this mint; nothing was written
    AlreadyCompleted,
}

// =========================================================================
// ProcessMintHandler
// =========================================================================

/// Handler for queued mints
pub struct ProcessMintHandler {
    store: SharedMintStore,
    settlement: SharedSettlementClient,
    settlement_timeout: Duration,
}

impl ProcessMintHandler {
    pub fn new(store: SharedMintStore, settlement: SharedSettlementClient) -> Self {
        Self {
            store,
            settlement,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
        }
    }

    /// Abandon a settlement call that runs longer than `timeout`; the mint
    /// is then recorded FAILED like any other transport error.
    pub fn with_settlement_timeout(mut self, timeout: Duration) -> Self {
        self.settlement_timeout = timeout;
        self
    }

    /// Handle one queue invocation. Exactly one delivery is accepted.
    pub async fn handle_batch(&self, deliveries: &[Delivery]) -> Result<ProcessOutcome, ProcessError> {
        let [delivery] = deliveries else {
            tracing::error!(count = deliveries.len(), "Rejecting batch, expected 1 message");
            return Err(ProcessError::BatchSize(deliveries.len()));
        };

        let message = MintCreatedMessage::from_body(&delivery.body)
            .map_err(|e| ProcessError::MalformedMessage(e.to_string()))?;

        if message.event_type != MINT_CREATED {
            return Err(ProcessError::MalformedMessage(format!(
                "unexpected event type {}",
                message.event_type
            )));
        }

        tracing::info!(
            mint_id = %message.mint_id,
            message_id = %delivery.message_id(),
            receive_count = delivery.receive_count(),
            "Processing mint"
        );

        let result = self.process(message.mint_id).await;

        match &result {
            Ok(_) => tracing::info!(mint_id = %message.mint_id, "Successfully processed mint"),
            Err(e) => tracing::error!(mint_id = %message.mint_id, error = %e, "Failed to process mint"),
        }

        result
    }

    /// Process a mint by id.
    ///
    /// On an error that left the record unrecorded, a FAILED write is
    /// attempted once; if that write fails too it is only logged and the
    /// original error is returned.
    pub async fn process(&self, mint_id: Uuid) -> Result<ProcessOutcome, ProcessError> {
        match self.try_process(mint_id).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                if error.needs_failure_record() {
                    self.record_failure(mint_id, &error).await;
                }
                Err(error)
            }
        }
    }

    async fn try_process(&self, mint_id: Uuid) -> Result<ProcessOutcome, ProcessError> {
        let record = self
            .store
            .get(mint_id)
            .await?
            .ok_or(ProcessError::NotFound(mint_id))?;

        if record.status.is_terminal() {
            tracing::info!(mint_id = %mint_id, "Mint already completed");
            return Ok(ProcessOutcome::AlreadyCompleted);
        }

        if let Some(outcome) = self.transition(mint_id, StatusUpdate::processing()).await? {
            return Ok(outcome);
        }

        let settled = tokio::time::timeout(self.settlement_timeout, self.settlement.settle(&record))
            .await
            .map_err(|_| SettlementError::Timeout(self.settlement_timeout))??;

        match settled {
            SettlementOutcome::Success { transaction_id } => {
                let update = StatusUpdate::completed(transaction_id.clone());
                if let Some(outcome) = self.transition(mint_id, update).await? {
                    return Ok(outcome);
                }

                tracing::info!(
                    mint_id = %mint_id,
                    transaction_id = %transaction_id,
                    "Mint completed successfully"
                );
                Ok(ProcessOutcome::Completed { transaction_id })
            }
            SettlementOutcome::Failure { reason } => {
                let update = StatusUpdate::failed(reason.clone());
                if let Some(outcome) = self.transition(mint_id, update).await? {
                    return Ok(outcome);
                }

                tracing::warn!(mint_id = %mint_id, reason = %reason, "Mint failed processing");
                Err(ProcessError::SettlementRejected { mint_id, reason })
            }
        }
    }

    /// Write a status update. Returns an outcome when processing must stop
    /// early because another delivery completed the mint.
    async fn transition(
        &self,
        mint_id: Uuid,
        update: StatusUpdate,
    ) -> Result<Option<ProcessOutcome>, ProcessError> {
        match self.store.update_status(mint_id, &update).await? {
            UpdateOutcome::Applied => {
                tracing::debug!(mint_id = %mint_id, status = %update.status(), "Mint status updated");
                Ok(None)
            }
            UpdateOutcome::Skipped {
                current: MintStatus::Completed,
            } => {
                tracing::info!(
                    mint_id = %mint_id,
                    attempted = %update.status(),
                    "Mint completed by another delivery, skipping write"
                );
                Ok(Some(ProcessOutcome::AlreadyCompleted))
            }
            UpdateOutcome::Skipped { current } => Err(ProcessError::UnexpectedStatus {
                mint_id,
                current,
                attempted: update.status(),
            }),
            UpdateOutcome::NotFound => Err(ProcessError::NotFound(mint_id)),
        }
    }

    async fn record_failure(&self, mint_id: Uuid, error: &ProcessError) {
        let update = StatusUpdate::failed(error.to_string());

        match self.store.update_status(mint_id, &update).await {
            Ok(UpdateOutcome::Applied) => {
                tracing::warn!(mint_id = %mint_id, error = %error, "Mint marked FAILED");
            }
            Ok(outcome) => {
                tracing::debug!(mint_id = %mint_id, ?outcome, "FAILED write not applied");
            }
            Err(db_error) => {
                tracing::error!(
                    mint_id = %mint_id,
                    error = %db_error,
                    "Failed to record mint failure"
                );
            }
        }
    }
}
