//! Supported tokens
//!
//! The fixed allow-list of assets a mint may request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset type requested by a mint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    Doge,
}

impl Token {
    /// Every token accepted by the creation path
    pub const SUPPORTED: &'static [Token] = &[Token::Doge];

    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Doge => "doge",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a token is not on the allow-list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported token: {0}")]
pub struct UnsupportedToken(pub String);

impl FromStr for Token {
    type Err = UnsupportedToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::SUPPORTED
            .iter()
            .copied()
            .find(|token| token.as_str() == s)
            .ok_or_else(|| UnsupportedToken(s.to_string()))
    }
}
