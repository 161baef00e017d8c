//! Pagination cursor
//!
//! The cursor is the last evaluated key of the creation-order index,
//! serialized as JSON and hex encoded so it survives a query string
//! untouched. Callers treat it as opaque.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{MintRecord, MINT_ENTITY_TYPE};

use super::StoreError;

/// Last evaluated key of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    pub mint_id: Uuid,
    pub entity_type: String,
    pub created_at: DateTime<Utc>,
}

impl PageCursor {
    /// Cursor pointing just past `record`
    pub fn after(record: &MintRecord) -> Self {
        Self {
            mint_id: record.mint_id,
            entity_type: record.entity_type.clone(),
            created_at: record.created_at,
        }
    }

    /// Encode into the opaque token handed to callers
    pub fn encode(&self) -> Result<String, StoreError> {
        let json = serde_json::to_vec(self)?;
        Ok(hex::encode(json))
    }

    /// Decode a token previously produced by [`PageCursor::encode`]
    pub fn decode(token: &str) -> Result<Self, StoreError> {
        let bytes = hex::decode(token).map_err(|e| StoreError::invalid_cursor(e.to_string()))?;
        let cursor: PageCursor =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::invalid_cursor(e.to_string()))?;

        if cursor.entity_type != MINT_ENTITY_TYPE {
            return Err(StoreError::invalid_cursor(format!(
                "cursor belongs to entity type {}",
                cursor.entity_type
            )));
        }

        Ok(cursor)
    }
}
