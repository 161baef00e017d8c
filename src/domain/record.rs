//! Mint record
//!
//! The unit of work and its audit trail, as persisted in the record store
//! and returned by the read API.

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MintAmount, MintStatus, Token};

/// Partition key of the creation-order index
pub const MINT_ENTITY_TYPE: &str = "MINT";

/// A persisted mint request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRecord {
    pub mint_id: Uuid,
    pub entity_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub token: Token,
    pub status: MintStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl MintRecord {
    /// Build a fresh PENDING record.
    ///
    /// `created_at` is truncated to microseconds so that every store backend
    /// sorts and compares it identically.
    pub fn new_pending(mint_id: Uuid, amount: MintAmount, token: Token) -> Self {
        Self {
            mint_id,
            entity_type: MINT_ENTITY_TYPE.to_string(),
            amount: amount.value(),
            token,
            status: MintStatus::Pending,
            created_at: Utc::now().trunc_subsecs(6),
            updated_at: None,
            transaction_id: None,
            error_message: None,
        }
    }

    /// Apply a status update in place.
    ///
    /// Optional fields already present are kept when the update carries none.
    pub fn apply(&mut self, update: &StatusUpdate, at: DateTime<Utc>) {
        self.status = update.status;
        self.updated_at = Some(at);

        if let Some(transaction_id) = &update.transaction_id {
            self.transaction_id = Some(transaction_id.clone());
        }
        if let Some(error_message) = &update.error_message {
            self.error_message = Some(error_message.clone());
        }
    }
}

/// A status mutation written by the processing path.
///
/// Only constructible through [`StatusUpdate::processing`],
/// [`StatusUpdate::completed`] and [`StatusUpdate::failed`], so a transaction
/// id can only travel with COMPLETED and an error message only with FAILED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    status: MintStatus,
    transaction_id: Option<String>,
    error_message: Option<String>,
}

impl StatusUpdate {
    pub fn processing() -> Self {
        Self {
            status: MintStatus::Processing,
            transaction_id: None,
            error_message: None,
        }
    }

    pub fn completed(transaction_id: impl Into<String>) -> Self {
        Self {
            status: MintStatus::Completed,
            transaction_id: Some(transaction_id.into()),
            error_message: None,
        }
    }

    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            status: MintStatus::Failed,
            transaction_id: None,
            error_message: Some(error_message.into()),
        }
    }

    pub fn status(&self) -> MintStatus {
        self.status
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}
