//! Domain Error Types
//!
//! Input validation errors for the mint API. These never have side effects:
//! a request that fails validation writes nothing and publishes nothing.

use thiserror::Error;

use super::{AmountError, UnsupportedToken};

/// Largest page the read API serves
pub const MAX_PAGE_LIMIT: u32 = 10;

/// Caller-side input errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Request body lacks `amount` or `token`
    #[error("Missing required fields: amount, token")]
    MissingFields,

    /// Request body is not a JSON object
    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    /// Amount is not a number, below 1, or beyond the decimal range
    #[error("{}", .0.client_message())]
    InvalidAmount(#[from] AmountError),

    /// Token is not on the allow-list
    #[error("The supported token is doge")]
    UnsupportedToken(#[from] UnsupportedToken),

    /// Page size outside 1..=10 or not a number
    #[error("limit should be a number between 1 and {MAX_PAGE_LIMIT}")]
    InvalidLimit(String),

    /// Query string could not be read
    #[error("Invalid query string: {0}")]
    MalformedQuery(String),

    /// Mint id is not a UUID
    #[error("Invalid mint id: {0}")]
    InvalidMintId(String),
}

impl ValidationError {
    /// Detail for logs; the display text is what callers see
    pub fn detail(&self) -> String {
        match self {
            ValidationError::InvalidAmount(e) => e.to_string(),
            ValidationError::UnsupportedToken(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}
