//! In-memory record store
//!
//! Mirrors the PostgreSQL layout: a primary map keyed by mint id plus an
//! ordered index keyed by `(entity_type, created_at, mint_id)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{MintRecord, MintStatus, StatusUpdate, MINT_ENTITY_TYPE};

use super::{MintStore, Page, PageCursor, StoreError, UpdateOutcome};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct IndexKey {
    entity_type: String,
    created_at: DateTime<Utc>,
    mint_id: Uuid,
}

impl IndexKey {
    fn of(record: &MintRecord) -> Self {
        Self {
            entity_type: record.entity_type.clone(),
            created_at: record.created_at,
            mint_id: record.mint_id,
        }
    }

    fn from_cursor(cursor: &PageCursor) -> Self {
        Self {
            entity_type: cursor.entity_type.clone(),
            created_at: cursor.created_at,
            mint_id: cursor.mint_id,
        }
    }

    fn partition_start(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            created_at: DateTime::<Utc>::MIN_UTC,
            mint_id: Uuid::nil(),
        }
    }

    fn partition_end(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            created_at: DateTime::<Utc>::MAX_UTC,
            mint_id: Uuid::from_u128(u128::MAX),
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    records: HashMap<Uuid, MintRecord>,
    created_at_index: BTreeSet<IndexKey>,
}

/// A thread-safe in-memory mint store.
///
/// Cloning shares the underlying tables, so a creation handler and a
/// processing handler built from clones see the same records.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMintStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryMintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.tables.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MintStore for InMemoryMintStore {
    async fn insert(&self, record: &MintRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        if tables.records.contains_key(&record.mint_id) {
            return Err(StoreError::DuplicateMint(record.mint_id));
        }

        tables.created_at_index.insert(IndexKey::of(record));
        tables.records.insert(record.mint_id, record.clone());
        Ok(())
    }

    async fn get(&self, mint_id: Uuid) -> Result<Option<MintRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.records.get(&mint_id).cloned())
    }

    async fn update_status(
        &self,
        mint_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(record) = tables.records.get_mut(&mint_id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        if !record.status.can_transition_to(update.status()) {
            return Ok(UpdateOutcome::Skipped {
                current: record.status,
            });
        }

        record.apply(update, Utc::now());
        Ok(UpdateOutcome::Applied)
    }

    async fn query_page(
        &self,
        limit: u32,
        start_after: Option<&PageCursor>,
    ) -> Result<Page, StoreError> {
        let tables = self.tables.read().await;

        let lower = Bound::Included(IndexKey::partition_start(MINT_ENTITY_TYPE));
        let upper = match start_after {
            Some(cursor) => Bound::Excluded(IndexKey::from_cursor(cursor)),
            None => Bound::Included(IndexKey::partition_end(MINT_ENTITY_TYPE)),
        };

        // Look one key ahead to know whether another page exists
        let mut items: Vec<MintRecord> = tables
            .created_at_index
            .range((lower, upper))
            .rev()
            .take(limit as usize + 1)
            .filter_map(|key| tables.records.get(&key.mint_id).cloned())
            .collect();

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
        let tables = self.tables.read().await;

        let mut stale: Vec<MintRecord> = tables
            .records
            .values()
            .filter(|r| r.status == status && r.updated_at.unwrap_or(r.created_at) < older_than)
            .cloned()
            .collect();

        stale.sort_by_key(|r| r.updated_at.unwrap_or(r.created_at));
        stale.truncate(limit as usize);
        Ok(stale)
    }
}
