//! Mint status state machine
//!
//! PENDING → PROCESSING → {COMPLETED, FAILED}
//!
//! COMPLETED is terminal. FAILED is terminal for a single delivery, but a
//! redelivered message re-enters PROCESSING so transient failures can recover.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Processing status of a mint record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MintStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl MintStatus {
    pub const ALL: [MintStatus; 4] = [
        MintStatus::Pending,
        MintStatus::Processing,
        MintStatus::Completed,
        MintStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MintStatus::Pending => "PENDING",
            MintStatus::Processing => "PROCESSING",
            MintStatus::Completed => "COMPLETED",
            MintStatus::Failed => "FAILED",
        }
    }

    /// Statuses a record may hold for a write of `next` to be applied
    pub fn predecessors(next: MintStatus) -> Vec<MintStatus> {
        MintStatus::ALL
            .iter()
            .copied()
            .filter(|current| current.can_transition_to(next))
            .collect()
    }

    /// Whether no processing attempt can change this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, MintStatus::Completed)
    }

    /// Check whether a status write from `self` to `next` is allowed.
    ///
    /// PENDING → FAILED is allowed because the best-effort failure write can
    /// happen before PROCESSING was recorded. PROCESSING → PROCESSING covers a
    /// redelivery after the visibility timeout expired mid-flight. FAILED →
    /// COMPLETED lets a settled duplicate win over a concurrent failed one.
    pub fn can_transition_to(&self, next: MintStatus) -> bool {
        use MintStatus::*;

        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Failed)
                | (Processing, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Processing)
                | (Failed, Completed)
                | (Failed, Failed)
        )
    }
}

impl fmt::Display for MintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a persisted status string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mint status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for MintStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(MintStatus::Pending),
            "PROCESSING" => Ok(MintStatus::Processing),
            "COMPLETED" => Ok(MintStatus::Completed),
            "FAILED" => Ok(MintStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
