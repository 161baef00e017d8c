//! Queue messages
//!
//! Wire format of the "mint created" notification and the envelope a
//! consumer receives for each delivery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type carried by every notification on the processing queue
pub const MINT_CREATED: &str = "MINT_CREATED";

/// Producer name attached to published messages
pub const MINT_SERVICE_SOURCE: &str = "mint-service";

/// Message body published after a record is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintCreatedMessage {
    pub mint_id: Uuid,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
}

impl MintCreatedMessage {
    pub fn new(mint_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            mint_id,
            event_type: MINT_CREATED.to_string(),
            created_at,
        }
    }

    /// Serialize to the body stored on the queue
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a queue body
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// String attributes carried next to the body, for filtering and tracing
/// without parsing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttributes {
    pub event_type: String,
    pub source: String,
    pub mint_id: Uuid,
}

impl MessageAttributes {
    pub fn for_mint_created(mint_id: Uuid) -> Self {
        Self {
            event_type: MINT_CREATED.to_string(),
            source: MINT_SERVICE_SOURCE.to_string(),
            mint_id,
        }
    }
}

/// Handle used to acknowledge one specific delivery of a message.
///
/// It names the receive attempt, so acknowledging an earlier delivery after
/// the message was handed out again does not delete it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiptHandle {
    pub message_id: Uuid,
    pub receive_count: u32,
}

/// A message handed to a consumer
#[derive(Debug, Clone)]
pub struct Delivery {
    pub receipt: ReceiptHandle,
    pub body: String,
    pub attributes: MessageAttributes,
    pub sent_at: DateTime<Utc>,
}

impl Delivery {
    pub fn message_id(&self) -> Uuid {
        self.receipt.message_id
    }

    /// How many times this message has been received, this delivery included
    pub fn receive_count(&self) -> u32 {
        self.receipt.receive_count
    }
}

/// A message diverted to the dead-letter channel
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub message_id: Uuid,
    pub body: String,
    pub attributes: MessageAttributes,
    pub receive_count: u32,
    pub sent_at: DateTime<Utc>,
    pub dead_lettered_at: DateTime<Utc>,
}

/// Message counts per queue state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub visible: u64,
    pub in_flight: u64,
    pub dead_lettered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_body_shape() {
        let mint_id = Uuid::new_v4();
        let message = MintCreatedMessage::new(mint_id, Utc::now());
        let json: serde_json::Value = serde_json::from_str(&message.to_body().unwrap()).unwrap();

        assert_eq!(json["mintId"], mint_id.to_string());
        assert_eq!(json["eventType"], "MINT_CREATED");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_message_body_parse() {
        let message = MintCreatedMessage::new(Uuid::new_v4(), Utc::now());
        let parsed = MintCreatedMessage::from_body(&message.to_body().unwrap()).unwrap();
        assert_eq!(parsed, message);

        assert!(MintCreatedMessage::from_body("{\"eventType\":\"MINT_CREATED\"}").is_err());
    }

    #[test]
    fn test_attributes_for_mint_created() {
        let mint_id = Uuid::new_v4();
        let attributes = MessageAttributes::for_mint_created(mint_id);
        assert_eq!(attributes.event_type, MINT_CREATED);
        assert_eq!(attributes.source, "mint-service");
        assert_eq!(attributes.mint_id, mint_id);
    }
}
