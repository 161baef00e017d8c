//! In-memory work queue
//!
//! Single-process queue with the same visibility and dead-letter semantics
//! as the PostgreSQL queue. Expired in-flight messages are returned to the
//! visible set lazily, on the next receive.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use super::{
    DeadLetter, Delivery, MessageAttributes, MintCreatedMessage, QueueDepth, QueueError,
    QueuePolicy, ReceiptHandle, WorkQueue,
};

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: Uuid,
    body: String,
    attributes: MessageAttributes,
    sent_at: DateTime<Utc>,
    receive_count: u32,
}

#[derive(Debug)]
struct InFlight {
    message: StoredMessage,
    visible_at: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    visible: VecDeque<StoredMessage>,
    in_flight: HashMap<Uuid, InFlight>,
    dead_letters: Vec<DeadLetter>,
}

impl QueueState {
    /// Move messages whose visibility timeout elapsed back to the front,
    /// oldest first.
    fn release_expired(&mut self, now: Instant) {
        let expired: Vec<Uuid> = self
            .in_flight
            .iter()
            .filter(|(_, in_flight)| in_flight.visible_at <= now)
            .map(|(id, _)| *id)
            .collect();

        let mut released: Vec<StoredMessage> = expired
            .into_iter()
            .filter_map(|id| self.in_flight.remove(&id))
            .map(|in_flight| in_flight.message)
            .collect();

        released.sort_by_key(|m| std::cmp::Reverse(m.sent_at));
        for message in released {
            self.visible.push_front(message);
        }
    }
}

/// A thread-safe in-memory queue with a dead-letter channel.
///
/// Clones share the same queue.
#[derive(Debug, Clone)]
pub struct InMemoryWorkQueue {
    state: Arc<Mutex<QueueState>>,
    policy: QueuePolicy,
}

impl InMemoryWorkQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            policy,
        }
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }
}

impl Default for InMemoryWorkQueue {
    fn default() -> Self {
        Self::new(QueuePolicy::default())
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn publish(
        &self,
        message: &MintCreatedMessage,
        attributes: MessageAttributes,
    ) -> Result<Uuid, QueueError> {
        let stored = StoredMessage {
            message_id: Uuid::new_v4(),
            body: message.to_body()?,
            attributes,
            sent_at: Utc::now(),
            receive_count: 0,
        };
        let message_id = stored.message_id;

        self.state.lock().await.visible.push_back(stored);
        Ok(message_id)
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>, QueueError> {
        let now = Instant::now();
        let mut state = self.state.lock().await;
        state.release_expired(now);

        let mut deliveries = Vec::with_capacity(max_messages);
        while deliveries.len() < max_messages {
            let Some(mut message) = state.visible.pop_front() else {
                break;
            };
            message.receive_count += 1;

            if message.receive_count > self.policy.max_receive_count {
                tracing::warn!(
                    message_id = %message.message_id,
                    mint_id = %message.attributes.mint_id,
                    receive_count = message.receive_count,
                    "Message exceeded max receive count, moving to dead-letter channel"
                );
                state.dead_letters.push(DeadLetter {
                    message_id: message.message_id,
                    body: message.body,
                    attributes: message.attributes,
                    receive_count: message.receive_count,
                    sent_at: message.sent_at,
                    dead_lettered_at: Utc::now(),
                });
                continue;
            }

            deliveries.push(Delivery {
                receipt: ReceiptHandle {
                    message_id: message.message_id,
                    receive_count: message.receive_count,
                },
                body: message.body.clone(),
                attributes: message.attributes.clone(),
                sent_at: message.sent_at,
            });
            state.in_flight.insert(
                message.message_id,
                InFlight {
                    message,
                    visible_at: now + self.policy.visibility_timeout,
                },
            );
        }

        Ok(deliveries)
    }

    async fn ack(&self, receipt: &ReceiptHandle) -> Result<bool, QueueError> {
        let mut state = self.state.lock().await;

        let current = state
            .in_flight
            .get(&receipt.message_id)
            .map(|in_flight| in_flight.message.receive_count);

        if current == Some(receipt.receive_count) {
            state.in_flight.remove(&receipt.message_id);
            return Ok(true);
        }

        Ok(false)
    }

    async fn dead_letters(&self, limit: u32) -> Result<Vec<DeadLetter>, QueueError> {
        let state = self.state.lock().await;
        Ok(state
            .dead_letters
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        let now = Instant::now();
        let state = self.state.lock().await;

        let expired = state
            .in_flight
            .values()
            .filter(|in_flight| in_flight.visible_at <= now)
            .count();

        Ok(QueueDepth {
            visible: (state.visible.len() + expired) as u64,
            in_flight: (state.in_flight.len() - expired) as u64,
            dead_lettered: state.dead_letters.len() as u64,
        })
    }
}
