//! Work Queue module
//!
//! At-least-once delivery of "mint created" notifications. A received
//! message stays hidden for the visibility timeout; if it is not
//! acknowledged in time it becomes visible again. Once a message has been
//! received more than `max_receive_count` times it is moved to the
//! dead-letter channel instead of being delivered.

mod memory;
mod message;
mod postgres;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub use memory::InMemoryWorkQueue;
pub use message::{
    DeadLetter, Delivery, MessageAttributes, MintCreatedMessage, QueueDepth, ReceiptHandle,
    MINT_CREATED, MINT_SERVICE_SOURCE,
};
pub use postgres::PgWorkQueue;

/// Shared handle to a queue backend
pub type SharedWorkQueue = Arc<dyn WorkQueue>;

/// Redelivery policy of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuePolicy {
    /// How long a received message stays hidden from other consumers
    pub visibility_timeout: Duration,
    /// Receives allowed before a message is dead-lettered
    pub max_receive_count: u32,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(300),
            max_receive_count: 1,
        }
    }
}

/// Queue errors
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Enqueue a message; returns its id
    async fn publish(
        &self,
        message: &MintCreatedMessage,
        attributes: MessageAttributes,
    ) -> Result<Uuid, QueueError>;

    /// Receive up to `max_messages` visible messages
    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>, QueueError>;

    /// Delete a delivered message. Returns false when the receipt is stale
    /// or the message is already gone.
    async fn ack(&self, receipt: &ReceiptHandle) -> Result<bool, QueueError>;

    /// Inspect the dead-letter channel, oldest first
    async fn dead_letters(&self, limit: u32) -> Result<Vec<DeadLetter>, QueueError>;

    async fn depth(&self) -> Result<QueueDepth, QueueError>;
}
