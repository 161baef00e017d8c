//! PostgreSQL work queue
//!
//! Messages live in the `mint_queue` table. Receiving claims rows with
//! `FOR UPDATE SKIP LOCKED`, so concurrent consumers never pick the same
//! visible row; dead-lettered rows stay in the table with
//! `dead_lettered_at` set.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    DeadLetter, Delivery, MessageAttributes, MintCreatedMessage, QueueDepth, QueueError,
    QueuePolicy, ReceiptHandle, WorkQueue,
};

type ClaimedRow = (
    Uuid,
    String,
    serde_json::Value,
    i32,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

/// Work queue on PostgreSQL
#[derive(Debug, Clone)]
pub struct PgWorkQueue {
    pool: PgPool,
    policy: QueuePolicy,
}

impl PgWorkQueue {
    pub fn new(pool: PgPool, policy: QueuePolicy) -> Self {
        Self { pool, policy }
    }
}

#[async_trait]
impl WorkQueue for PgWorkQueue {
    async fn publish(
        &self,
        message: &MintCreatedMessage,
        attributes: MessageAttributes,
    ) -> Result<Uuid, QueueError> {
        let message_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO mint_queue (message_id, body, attributes)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(message_id)
        .bind(message.to_body()?)
        .bind(serde_json::to_value(&attributes)?)
        .execute(&self.pool)
        .await?;

        Ok(message_id)
    }

    async fn receive(&self, max_messages: usize) -> Result<Vec<Delivery>, QueueError> {
        let rows: Vec<ClaimedRow> = sqlx::query_as(
            r#"
            WITH picked AS (
                SELECT message_id
                FROM mint_queue
                WHERE dead_lettered_at IS NULL AND visible_at <= NOW()
                ORDER BY sent_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE mint_queue q
            SET receive_count = q.receive_count + 1,
                visible_at = NOW() + make_interval(secs => $2),
                dead_lettered_at = CASE
                    WHEN q.receive_count + 1 > $3 THEN NOW()
                    ELSE NULL
                END
            FROM picked
            WHERE q.message_id = picked.message_id
            RETURNING q.message_id, q.body, q.attributes, q.receive_count,
                      q.sent_at, q.dead_lettered_at
            "#,
        )
        .bind(max_messages as i64)
        .bind(self.policy.visibility_timeout.as_secs_f64())
        .bind(self.policy.max_receive_count as i32)
        .fetch_all(&self.pool)
        .await?;

        let mut deliveries = Vec::with_capacity(rows.len());
        for (message_id, body, attributes, receive_count, sent_at, dead_lettered_at) in rows {
            let attributes: MessageAttributes = serde_json::from_value(attributes)?;

            if dead_lettered_at.is_some() {
                tracing::warn!(
                    message_id = %message_id,
                    mint_id = %attributes.mint_id,
                    receive_count = receive_count,
                    "Message exceeded max receive count, moving to dead-letter channel"
                );
                continue;
            }

            deliveries.push(Delivery {
                receipt: ReceiptHandle {
                    message_id,
                    receive_count: receive_count as u32,
                },
                body,
                attributes,
                sent_at,
            });
        }

        Ok(deliveries)
    }

    async fn ack(&self, receipt: &ReceiptHandle) -> Result<bool, QueueError> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM mint_queue
            WHERE message_id = $1 AND receive_count = $2 AND dead_lettered_at IS NULL
            "#,
        )
        .bind(receipt.message_id)
        .bind(receipt.receive_count as i32)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted > 0)
    }

    async fn dead_letters(&self, limit: u32) -> Result<Vec<DeadLetter>, QueueError> {
        let rows: Vec<(Uuid, String, serde_json::Value, i32, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                r#"
                SELECT message_id, body, attributes, receive_count, sent_at, dead_lettered_at
                FROM mint_queue
                WHERE dead_lettered_at IS NOT NULL
                ORDER BY dead_lettered_at ASC
                LIMIT $1
                "#,
            )
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(
                |(message_id, body, attributes, receive_count, sent_at, dead_lettered_at)| {
                    Ok(DeadLetter {
                        message_id,
                        body,
                        attributes: serde_json::from_value(attributes)?,
                        receive_count: receive_count as u32,
                        sent_at,
                        dead_lettered_at,
                    })
                },
            )
            .collect()
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        let (visible, in_flight, dead_lettered): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE dead_lettered_at IS NULL AND visible_at <= NOW()),
                COUNT(*) FILTER (WHERE dead_lettered_at IS NULL AND visible_at > NOW()),
                COUNT(*) FILTER (WHERE dead_lettered_at IS NOT NULL)
            FROM mint_queue
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(QueueDepth {
            visible: visible as u64,
            in_flight: in_flight as u64,
            dead_lettered: dead_lettered as u64,
        })
    }
}
