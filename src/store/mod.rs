//! Record Store module
//!
//! Durable key-value storage of mint records with a secondary index
//! ordered by creation time. Two backends implement [`MintStore`]:
//! PostgreSQL for deployments and an in-memory map for tests and
//! single-process runs.

mod cursor;
mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{MintRecord, MintStatus, StatusUpdate};

pub use cursor::PageCursor;
pub use error::StoreError;
pub use memory::InMemoryMintStore;
pub use postgres::PgMintStore;

/// Shared handle to a store backend
pub type SharedMintStore = Arc<dyn MintStore>;

/// One page read from the creation-order index
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<MintRecord>,
    /// Present iff more records follow this page
    pub last_evaluated_key: Option<PageCursor>,
}

/// Result of a conditional status write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// The record's current status does not allow the write
    Skipped { current: MintStatus },
    NotFound,
}

#[async_trait]
pub trait MintStore: Send + Sync {
    /// Persist a new record; fails if the id is taken
    async fn insert(&self, record: &MintRecord) -> Result<(), StoreError>;

    /// Fetch a record by primary key
    async fn get(&self, mint_id: Uuid) -> Result<Option<MintRecord>, StoreError>;

    /// Write a status transition.
    ///
    /// The write is applied only when the stored status may move to the
    /// update's status, so nothing ever mutates a COMPLETED record.
    async fn update_status(
        &self,
        mint_id: Uuid,
        update: &StatusUpdate,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Read the creation-order index newest first, starting strictly after
    /// `start_after` when given.
    async fn query_page(
        &self,
        limit: u32,
        start_after: Option<&PageCursor>,
    ) -> Result<Page, StoreError>;

    /// Records in `status` whose last change is older than `older_than`,
    /// oldest first.
    async fn find_stale(
        &self,
        status: MintStatus,
        older_than: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<MintRecord>, StoreError>;
}
