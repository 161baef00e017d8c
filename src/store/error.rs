//! Record Store Errors

use uuid::Uuid;

/// Errors that can occur in the record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this id already exists
    #[error("Mint already exists: {0}")]
    DuplicateMint(Uuid),

    /// Pagination token could not be decoded
    #[error("Invalid pagination token")]
    InvalidCursor { reason: String },

    /// Persisted row does not map onto a mint record
    #[error("Corrupt mint record {mint_id}: {reason}")]
    Corrupt { mint_id: Uuid, reason: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend temporarily unable to serve the call
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn invalid_cursor(reason: impl Into<String>) -> Self {
        Self::InvalidCursor {
            reason: reason.into(),
        }
    }

    /// Check if this error was caused by caller input
    pub fn is_invalid_cursor(&self) -> bool {
        matches!(self, StoreError::InvalidCursor { .. })
    }

    /// Check if a redelivery may succeed where this call failed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Database(_) | StoreError::Unavailable(_))
    }
}
