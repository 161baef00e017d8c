//! Command definitions
//!
//! Commands and queries accepted by the handlers, parsed and validated from
//! their wire form before any handler runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{MintAmount, MintRecord, MintStatus, Token, ValidationError, MAX_PAGE_LIMIT};

// =========================================================================
// CreateMintCommand
// =========================================================================

/// Command to request a new mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateMintCommand {
    pub amount: MintAmount,
    pub token: Token,
}

impl CreateMintCommand {
    pub fn new(amount: MintAmount, token: Token) -> Self {
        Self { amount, token }
    }

    /// Validate a raw request body.
    ///
    /// A field counts as missing when it is absent, `null`, or (for the
    /// token) an empty string. Presence is checked before either value.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let Value::Object(fields) = body else {
            return Err(ValidationError::MalformedBody(
                "expected a JSON object".to_string(),
            ));
        };

        let amount = fields.get("amount").filter(|v| !v.is_null());
        let token = fields
            .get("token")
            .filter(|v| !v.is_null() && v.as_str() != Some(""));

        let (Some(amount), Some(token)) = (amount, token) else {
            return Err(ValidationError::MissingFields);
        };

        let amount = MintAmount::from_json(amount)?;
        let token = match token {
            Value::String(s) => s.parse::<Token>()?,
            other => other.to_string().parse::<Token>()?,
        };

        Ok(Self::new(amount, token))
    }
}

/// Result of an accepted mint request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMintResult {
    pub mint_id: Uuid,
    pub status: MintStatus,
    pub created_at: DateTime<Utc>,
}

// =========================================================================
// ListMintsQuery
// =========================================================================

/// Query for one page of mints, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMintsQuery {
    pub limit: u32,
    /// Opaque continuation token from a previous page
    pub next_token: Option<String>,
}

impl ListMintsQuery {
    pub fn new(limit: u32) -> Result<Self, ValidationError> {
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(ValidationError::InvalidLimit(limit.to_string()));
        }

        Ok(Self {
            limit,
            next_token: None,
        })
    }

    pub fn with_next_token(mut self, next_token: String) -> Self {
        self.next_token = Some(next_token);
        self
    }

    /// Validate raw query parameters.
    ///
    /// An absent or empty `limit` defaults to the maximum page size; an
    /// empty `nextToken` means the first page.
    pub fn from_params(
        limit: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let limit = match limit.map(str::trim).filter(|s| !s.is_empty()) {
            None => MAX_PAGE_LIMIT,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ValidationError::InvalidLimit(raw.to_string()))?,
        };

        let query = Self::new(limit)?;

        Ok(match next_token.filter(|t| !t.is_empty()) {
            Some(token) => query.with_next_token(token.to_string()),
            None => query,
        })
    }
}

impl Default for ListMintsQuery {
    fn default() -> Self {
        Self {
            limit: MAX_PAGE_LIMIT,
            next_token: None,
        }
    }
}

/// One page of mints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintPage {
    pub items: Vec<MintRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub has_more: bool,
}
