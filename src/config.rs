//! # Dispatcher Configuration
//!
//! Explicit configuration for the dispatch components, passed in at
//! construction time. The two well-known queue task names live here rather
//! than in process-global mutable state, so independent dispatcher instances
//! can coexist in one process (and in tests).

use crate::constants::{
    DEFAULT_BACKOFF_SCHEDULE_SECONDS, DEFAULT_EVENT_CAPACITY, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RECEIVER_TASK_NAME, DEFAULT_TRIGGER_TASK_NAME,
};
use crate::error::{Result, SignalRelayError};

/// Configuration shared by the Dispatch Coordinator, Retry Controller,
/// and Delivery Worker
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Queue task name for the trigger entry point
    pub trigger_task_name: String,
    /// Queue task name for the receiver-execution entry point
    pub receiver_task_name: String,
    /// Backoff delays in seconds, indexed by attempt and clamped to the
    /// last entry
    pub backoff_schedule_seconds: Vec<u64>,
    /// Maximum delivery attempts per chain, initial attempt included
    pub max_attempts: u32,
    /// Capacity of the lifecycle event broadcast channel
    pub event_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            trigger_task_name: DEFAULT_TRIGGER_TASK_NAME.to_string(),
            receiver_task_name: DEFAULT_RECEIVER_TASK_NAME.to_string(),
            backoff_schedule_seconds: DEFAULT_BACKOFF_SCHEDULE_SECONDS.to_vec(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl DispatcherConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("SIGNAL_RELAY_TRIGGER_TASK_NAME") {
            config.trigger_task_name = name;
        }

        if let Ok(name) = std::env::var("SIGNAL_RELAY_RECEIVER_TASK_NAME") {
            config.receiver_task_name = name;
        }

        if let Ok(max_attempts) = std::env::var("SIGNAL_RELAY_MAX_ATTEMPTS") {
            config.max_attempts = max_attempts.parse().map_err(|e| {
                SignalRelayError::configuration("config", format!("Invalid max_attempts: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency of the configuration
    pub fn validate(&self) -> Result<()> {
        if self.trigger_task_name.is_empty() || self.receiver_task_name.is_empty() {
            return Err(SignalRelayError::configuration(
                "config",
                "task names must not be empty",
            ));
        }
        if self.trigger_task_name == self.receiver_task_name {
            return Err(SignalRelayError::configuration(
                "config",
                "trigger and receiver task names must differ",
            ));
        }
        if self.backoff_schedule_seconds.is_empty() {
            return Err(SignalRelayError::configuration(
                "config",
                "backoff schedule must have at least one entry",
            ));
        }
        if self.max_attempts == 0 {
            return Err(SignalRelayError::configuration(
                "config",
                "max_attempts must be at least 1",
            ));
        }
        Ok(())
    }
}
