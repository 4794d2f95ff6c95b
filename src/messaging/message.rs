//! # Delivery Message
//!
//! The unit of queue work: one attempt to run some subset of a signal's
//! receivers. Carries the full retry state of its chain, so any worker can
//! pick up any attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::registry::{LookupKey, ReceiverContext};

/// Message for signal delivery via queues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryMessage {
    /// Stable name of the signal to deliver
    pub signal_name: String,
    /// Opaque identifier of the originating entity
    pub sender: String,
    /// Cumulative lookup keys known to have already succeeded in this chain
    #[serde(default)]
    pub finished_receivers: Vec<LookupKey>,
    /// Explicit subset of receivers to invoke; `None` means all live
    /// receivers
    #[serde(default)]
    pub target_receivers: Option<Vec<LookupKey>>,
    /// Arbitrary named arguments forwarded verbatim to receivers
    #[serde(default)]
    pub kwargs: HashMap<String, Value>,
    /// Message metadata
    pub metadata: DeliveryMetadata,
}

/// Metadata for delivery messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryMetadata {
    /// When the chain's first message was created
    pub created_at: DateTime<Utc>,
    /// Attempt index within the chain, 0-based
    pub attempt: u32,
    /// Maximum delivery attempts for the chain, initial attempt included
    pub max_attempts: u32,
    /// Correlation ID tying every attempt of one chain together
    pub correlation_id: Option<String>,
}

impl Default for DeliveryMetadata {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            attempt: 0,
            max_attempts: crate::constants::DEFAULT_MAX_ATTEMPTS,
            correlation_id: Some(Uuid::new_v4().to_string()),
        }
    }
}

impl DeliveryMessage {
    /// Create a new first-attempt message for a signal emission
    pub fn new(signal_name: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            signal_name: signal_name.into(),
            sender: sender.into(),
            finished_receivers: Vec::new(),
            target_receivers: None,
            kwargs: HashMap::new(),
            metadata: DeliveryMetadata::default(),
        }
    }

    /// Set the named arguments forwarded to receivers
    pub fn with_kwargs(mut self, kwargs: HashMap<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Address the message to an explicit receiver subset
    pub fn with_target_receivers(mut self, targets: Vec<LookupKey>) -> Self {
        self.target_receivers = Some(targets);
        self
    }

    /// Set the chain's attempt cap
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.metadata.max_attempts = max_attempts;
        self
    }

    /// Build the follow-up message for the next attempt of this chain.
    ///
    /// Targets are reset to "all live receivers" and the cumulative
    /// finished set carries forward, so the next attempt skips everyone
    /// already done. Creation time and correlation ID are preserved.
    pub fn next_attempt(&self, finished_receivers: Vec<LookupKey>) -> Self {
        Self {
            signal_name: self.signal_name.clone(),
            sender: self.sender.clone(),
            finished_receivers,
            target_receivers: None,
            kwargs: self.kwargs.clone(),
            metadata: DeliveryMetadata {
                created_at: self.metadata.created_at,
                attempt: self.metadata.attempt + 1,
                max_attempts: self.metadata.max_attempts,
                correlation_id: self.metadata.correlation_id.clone(),
            },
        }
    }

    /// The receiver-invocation context carried by this message
    pub fn receiver_context(&self) -> ReceiverContext {
        ReceiverContext {
            kwargs: self.kwargs.clone(),
            finished_receivers: self.finished_receivers.clone(),
            target_receivers: self.target_receivers.clone(),
        }
    }

    /// Whether this message's attempt is the last one the chain allows
    pub fn is_final_attempt(&self) -> bool {
        self.metadata.attempt + 1 >= self.metadata.max_attempts
    }

    /// Convert to JSON for queue storage
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Create from JSON read off a queue
    pub fn from_json(json: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }
}
