//! Settlement module
//!
//! The external settlement call made for every mint. The only client is a
//! simulation: it takes a fixed latency and fails with a fixed probability.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::MintRecord;

/// Reason reported by the simulated service when it declines a mint
pub const SIMULATED_FAILURE_MESSAGE: &str = "External service failed";

const TRANSACTION_SUFFIX_LEN: usize = 9;
const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Shared handle to a settlement client
pub type SharedSettlementClient = Arc<dyn SettlementClient>;

/// Result of a settlement call that reached the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Success { transaction_id: String },
    /// The service answered and declined
    Failure { reason: String },
}

/// Settlement transport errors
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("Settlement service unreachable: {0}")]
    Unreachable(String),

    #[error("Settlement call timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait SettlementClient: Send + Sync {
    async fn settle(&self, record: &MintRecord) -> Result<SettlementOutcome, SettlementError>;
}

// =========================================================================
// SimulatedSettlement
// =========================================================================

/// Simulated settlement service
#[derive(Debug, Clone)]
pub struct SimulatedSettlement {
    latency: Duration,
    failure_rate: f64,
}

impl SimulatedSettlement {
    /// `failure_rate` is clamped to `[0, 1]`
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        Self {
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    /// Draw the outcome of one call
    fn roll(&self) -> SettlementOutcome {
        let mut rng = rand::thread_rng();

        if rng.gen::<f64>() < self.failure_rate {
            return SettlementOutcome::Failure {
                reason: SIMULATED_FAILURE_MESSAGE.to_string(),
            };
        }

        let suffix: String = (0..TRANSACTION_SUFFIX_LEN)
            .map(|_| BASE36_ALPHABET[rng.gen_range(0..BASE36_ALPHABET.len())] as char)
            .collect();

        SettlementOutcome::Success {
            transaction_id: format!("txn_{}_{}", Utc::now().timestamp_millis(), suffix),
        }
    }
}

impl Default for SimulatedSettlement {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000), 0.2)
    }
}

#[async_trait]
impl SettlementClient for SimulatedSettlement {
    async fn settle(&self, record: &MintRecord) -> Result<SettlementOutcome, SettlementError> {
        tracing::info!(mint_id = %record.mint_id, "Calling external settlement service");

        tokio::time::sleep(self.latency).await;

        Ok(self.roll())
    }
}
