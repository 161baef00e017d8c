//! PostgreSQL record store
//!
//! Backed by the `mints` table (see `migrations/`). The creation-order
//! index is `(entity_type, created_at DESC, mint_id DESC)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{MintRecord, MintStatus, StatusUpdate, MINT_ENTITY_TYPE};

use super::{MintStore, Page, PageCursor, StoreError, UpdateOutcome};

type MintRow = (
    Uuid,
    String,
    Decimal,
    String,
    String,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<String>,
    Option<String>,
);

fn record_from_row(row: MintRow) -> Result<MintRecord, StoreError> {
    let (
        mint_id,
        entity_type,
        amount,
        token,
        status,
        created_at,
        updated_at,
        transaction_id,
        error_message,
    ) = row;

    let corrupt = |reason: String| StoreError::Corrupt { mint_id, reason };

    Ok(MintRecord {
        mint_id,
        entity_type,
        amount,
        token: token.parse().map_err(|e| corrupt(format!("{e}")))?,
        status: status.parse().map_err(|e| corrupt(format!("{e}")))?,
        created_at,
        updated_at,
        transaction_id,
        error_message,
    })
}

/// Mint store on PostgreSQL
#[derive(Debug, Clone)]
pub struct PgMintStore {
    pool: PgPool,
}

impl PgMintStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MintStore for PgMintStore {
    async fn insert(&self, record: &MintRecord) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO mints (
                mint_id, entity_type, amount, token, status,
                created_at, updated_at, transaction_id, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (mint_id) DO NOTHING
            "#,
        )
        .bind(record.mint_id)
        .bind(&record.entity_type)
        .bind(record.amount)
        .bind(record.token.as_str())
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(&record.transaction_id)
        .bind(&record.error_message)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateMint(record.mint_id));
        }

        Ok(())
    }

    async fn get(&self, mint_id: Uuid) -> Result<Option<MintRecord>, StoreError> {
        let row: Option<MintRow> = sqlx::query_as(
            r#"
            SELECT mint_id, entity_type, amount, token, status,
                   created_at, updated_at, transaction_id, error_message
            FROM mints
            WHERE mint_id = $1
            "#,
        )
        .bind(mint_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(record_from_row).transpose()
    }

    async fn update_status(
        &self,
        mint_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<UpdateOutcome, StoreError> {
        let allowed_from: Vec<String> = MintStatus::predecessors(update.status())
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE mints
            SET status = $2,
                updated_at = NOW(),
                transaction_id = COALESCE($3, transaction_id),
                error_message = COALESCE($4, error_message)
            WHERE mint_id = $1 AND status = ANY($5)
            RETURNING mint_id
            "#,
        )
        .bind(mint_id)
        .bind(update.status().as_str())
        .bind(update.transaction_id())
        .bind(update.error_message())
        .bind(&allowed_from)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() {
            return Ok(UpdateOutcome::Applied);
        }

        // Nothing matched: either the record is missing or its status forbids the write
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM mints WHERE mint_id = $1")
                .bind(mint_id)
                .fetch_optional(&self.pool)
                .await?;

        match current {
            None => Ok(UpdateOutcome::NotFound),
            Some(status) => {
                let current = status.parse().map_err(|e| StoreError::Corrupt {
                    mint_id,
                    reason: format!("{e}"),
                })?;
                Ok(UpdateOutcome::Skipped { current })
            }
        }
    }

    async fn query_page(
        &self,
        limit: u32,
        start_after: Option<&PageCursor>,
    ) -> Result<Page, StoreError> {
        let rows: Vec<MintRow> = sqlx::query_as(
            r#"
            SELECT mint_id, entity_type, amount, token, status,
                   created_at, updated_at, transaction_id, error_message
            FROM mints
            WHERE entity_type = $1
              AND ($2::timestamptz IS NULL OR (created_at, mint_id) < ($2::timestamptz, $3::uuid))
            ORDER BY created_at DESC, mint_id DESC
            LIMIT $4
            "#,
        )
        .bind(MINT_ENTITY_TYPE)
        .bind(start_after.map(|c| c.created_at))
        .bind(start_after.map(|c| c.mint_id))
        .bind(i64::from(limit) + 1)
        .fetch_all(&self.pool)
        .await?;

        let mut items = rows
            .into_iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let last_evaluated_key = if items.len() > limit as usize {
            items.truncate(limit as usize);
            items.last().map(PageCursor::after)
        } else {
            None
        };

        Ok(Page {
            items,
            last_evaluated_key,
        })
    }

    async fn find_stale(
        &self,
        status: MintStatus,
        older_than: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<MintRecord>, StoreError> {
        let rows: Vec<MintRow> = sqlx::query_as(
            r#"
            SELECT mint_id, entity_type, amount, token, status,
                   created_at, updated_at, transaction_id, error_message
            FROM mints
            WHERE status = $1 AND COALESCE(updated_at, created_at) < $2
            ORDER BY COALESCE(updated_at, created_at) ASC
            LIMIT $3
            "#,
        )
        .bind(status.as_str())
        .bind(older_than)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(record_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(token: &str, status: &str) -> MintRow {
        (
            Uuid::new_v4(),
            MINT_ENTITY_TYPE.to_string(),
            dec!(100),
            token.to_string(),
            status.to_string(),
            Utc::now(),
            None,
            None,
            None,
        )
    }

    #[test]
    fn test_record_from_row() {
        let record = record_from_row(row("doge", "PENDING")).unwrap();
        assert_eq!(record.status, MintStatus::Pending);
        assert_eq!(record.amount, dec!(100));
    }

    #[test]
    fn test_record_from_row_rejects_unknown_values() {
        assert!(matches!(
            record_from_row(row("btc", "PENDING")),
            Err(StoreError::Corrupt { .. })
        ));
        assert!(matches!(
            record_from_row(row("doge", "SETTLED")),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
