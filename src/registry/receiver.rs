//! # Receiver Trait and Addressing
//!
//! Receivers are polymorphic over a single capability: invoke with a sender
//! and a context of named arguments, return a result or fail. Each
//! (receiver, sender) pair is addressed by a stable [`LookupKey`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Result of one receiver invocation
pub type ReceiverResult = std::result::Result<Value, Box<dyn std::error::Error + Send + Sync>>;

/// Trait for signal receivers
#[async_trait]
pub trait SignalReceiver: Send + Sync {
    /// Handle one signal delivery
    async fn receive(&self, sender: &str, context: &ReceiverContext) -> ReceiverResult;

    /// Stable name identifying this receiver across process restarts.
    ///
    /// Lookup keys are derived from this name, so it must not change
    /// between deploys while delivery chains are in flight.
    fn receiver_name(&self) -> &str;
}

/// Stable, serializable identifier for a (receiver, sender) pair.
///
/// Derived from the receiver's registered name and the sender identity, so
/// the same pair yields the same key in every process. Used to address
/// individual deliveries and to deduplicate completions across retries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupKey(String);

impl LookupKey {
    /// Derive the key for a (receiver, sender) pair
    pub fn for_pair(receiver_name: &str, sender: &str) -> Self {
        Self(format!("{receiver_name}@{sender}"))
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LookupKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Context passed to every receiver invocation.
///
/// Carries the emission's named arguments plus the retry bookkeeping of the
/// delivery unit that triggered the invocation, so receivers that care can
/// observe where they sit in a chain.
#[derive(Debug, Clone, Default)]
pub struct ReceiverContext {
    /// Named arguments forwarded verbatim from the emission
    pub kwargs: HashMap<String, Value>,
    /// Lookup keys known to have already succeeded earlier in the chain
    pub finished_receivers: Vec<LookupKey>,
    /// Explicit subset of receivers addressed by this delivery unit,
    /// absent when the unit targets all live receivers
    pub target_receivers: Option<Vec<LookupKey>>,
}

impl ReceiverContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named argument
    pub fn with_kwarg(mut self, key: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    /// Set the finished-receiver bookkeeping
    pub fn with_finished_receivers(mut self, finished: Vec<LookupKey>) -> Self {
        self.finished_receivers = finished;
        self
    }

    /// Set the explicit target subset
    pub fn with_target_receivers(mut self, targets: Vec<LookupKey>) -> Self {
        self.target_receivers = Some(targets);
        self
    }
}
