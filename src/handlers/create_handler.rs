//! Create Handler
//!
//! Accepts a validated mint request: writes the PENDING record, then
//! publishes the notification that drives processing.

use uuid::Uuid;

use crate::domain::MintRecord;
use crate::error::AppError;
use crate::queue::{MessageAttributes, MintCreatedMessage, SharedWorkQueue};
use crate::store::SharedMintStore;

use super::{CreateMintCommand, CreateMintResult};

/// Handler for mint creation
pub struct CreateMintHandler {
    store: SharedMintStore,
    queue: SharedWorkQueue,
}

impl CreateMintHandler {
    pub fn new(store: SharedMintStore, queue: SharedWorkQueue) -> Self {
        Self { store, queue }
    }

    /// Execute the create command
    ///
    /// The record is written before the notification is published. If the
    /// publish fails the record stays PENDING with no message behind it; the
    /// error is returned and nothing is rolled back.
    pub async fn execute(&self, command: CreateMintCommand) -> Result<CreateMintResult, AppError> {
        let mint_id = Uuid::new_v4();
        let record = MintRecord::new_pending(mint_id, command.amount, command.token);

        self.store.insert(&record).await?;

        tracing::info!(
            mint_id = %mint_id,
            amount = %record.amount,
            token = %record.token,
            "Mint record created"
        );

        let message = MintCreatedMessage::new(mint_id, record.created_at);
        let message_id = match self
            .queue
            .publish(&message, MessageAttributes::for_mint_created(mint_id))
            .await
        {
            Ok(message_id) => message_id,
            Err(e) => {
                tracing::error!(
                    mint_id = %mint_id,
                    error = %e,
                    "Failed to publish mint notification, record left PENDING"
                );
                return Err(e.into());
            }
        };

        tracing::info!(
            mint_id = %mint_id,
            message_id = %message_id,
            "Mint notification published"
        );

        Ok(CreateMintResult {
            mint_id,
            status: record.status,
            created_at: record.created_at,
        })
    }
}
