//! # Dispatch Result Types
//!
//! Transient outcome bookkeeping produced by one coordinator or controller
//! operation. An [`OutcomeSet`] lives only for the duration of one
//! controller invocation; it is never persisted.

use serde_json::Value;
use std::time::Duration;

use crate::error::SignalRelayError;
use crate::registry::LookupKey;

/// Result of fanning one signal emission out into delivery units
#[derive(Debug, Clone)]
pub struct TriggerResult {
    pub signal_name: String,
    pub sender: String,
    /// Lookup keys addressed, one delivery unit each, in receiver order
    pub submitted: Vec<LookupKey>,
}

impl TriggerResult {
    /// Number of delivery units submitted
    pub fn delivery_count(&self) -> usize {
        self.submitted.len()
    }
}

/// Partition of one attempt's receiver invocations into successes and
/// failures
#[derive(Debug)]
pub struct OutcomeSet {
    /// Receivers that succeeded this attempt, with their results
    pub succeeded: Vec<(LookupKey, Value)>,
    /// Receivers that failed this attempt, with their errors
    pub failed: Vec<(LookupKey, SignalRelayError)>,
}

impl OutcomeSet {
    /// Partition raw send-robust responses
    pub fn partition(responses: Vec<(LookupKey, Result<Value, SignalRelayError>)>) -> Self {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (key, response) in responses {
            match response {
                Ok(value) => succeeded.push((key, value)),
                Err(err) => failed.push((key, err)),
            }
        }
        Self { succeeded, failed }
    }

    /// Whether any receiver failed this attempt
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Lookup keys that succeeded this attempt, in invocation order
    pub fn succeeded_keys(&self) -> Vec<LookupKey> {
        self.succeeded.iter().map(|(key, _)| key.clone()).collect()
    }

    /// One line per failure, for retry and terminal-failure records
    pub fn failure_summary(&self) -> String {
        self.failed
            .iter()
            .map(|(_, err)| err.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Outcome of executing one delivery unit
#[derive(Debug)]
pub enum ExecutionOutcome {
    /// Every selected receiver succeeded; the chain terminates
    Completed {
        /// Cumulative finished set, carried keys included
        finished_receivers: Vec<LookupKey>,
        /// Receivers invoked this attempt
        invoked: usize,
    },
    /// At least one receiver failed; the remainder was resubmitted
    Retried {
        /// Delay applied to the resubmitted unit
        delay: Duration,
        /// Cumulative finished set carried into the next attempt
        finished_receivers: Vec<LookupKey>,
        /// Attempt index of the resubmitted unit
        next_attempt: u32,
        /// Number of receivers that failed this attempt
        failed: usize,
    },
}
