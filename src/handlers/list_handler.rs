//! List Handler
//!
//! Read side of the API: pages of mints newest first, and single lookups.

use uuid::Uuid;

use crate::domain::MintRecord;
use crate::error::AppError;
use crate::store::{PageCursor, SharedMintStore};

use super::{ListMintsQuery, MintPage};

/// Handler for mint reads
pub struct ListMintsHandler {
    store: SharedMintStore,
}

impl ListMintsHandler {
    pub fn new(store: SharedMintStore) -> Self {
        Self { store }
    }

    /// Read one page. `hasMore` and `nextToken` are present together.
    pub async fn list(&self, query: ListMintsQuery) -> Result<MintPage, AppError> {
        let cursor = query
            .next_token
            .as_deref()
            .map(PageCursor::decode)
            .transpose()?;

        let page = self.store.query_page(query.limit, cursor.as_ref()).await?;

        let next_token = page
            .last_evaluated_key
            .as_ref()
            .map(PageCursor::encode)
            .transpose()?;

        tracing::debug!(
            limit = query.limit,
            returned = page.items.len(),
            has_more = next_token.is_some(),
            "Mint page read"
        );

        Ok(MintPage {
            items: page.items,
            has_more: next_token.is_some(),
            next_token,
        })
    }

    /// Fetch one mint by id
    pub async fn get(&self, mint_id: Uuid) -> Result<MintRecord, AppError> {
        self.store
            .get(mint_id)
            .await?
            .ok_or(AppError::MintNotFound(mint_id))
    }
}
