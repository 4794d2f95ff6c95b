//! # System Constants
//!
//! Well-known task names, retry defaults, and lifecycle event names shared
//! across the dispatch components. Runtime overrides live in
//! [`crate::config::DispatcherConfig`]; these are the canonical defaults.

/// Default queue task name for the trigger entry point
pub const DEFAULT_TRIGGER_TASK_NAME: &str = "signal_relay.trigger_signal";

/// Default queue task name for the receiver-execution entry point
pub const DEFAULT_RECEIVER_TASK_NAME: &str = "signal_relay.execute_receivers";

/// Fixed backoff schedule in seconds, indexed by attempt.
///
/// Attempt indexes beyond the table are clamped to the last entry, so a
/// long-failing chain settles at one retry per hour.
pub const DEFAULT_BACKOFF_SCHEDULE_SECONDS: [u64; 14] =
    [0, 2, 4, 6, 8, 10, 20, 40, 60, 120, 300, 600, 1800, 3600];

/// Maximum number of delivery attempts per chain, the initial attempt
/// included. Exceeding the cap is a terminal failure, not a silent drop.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Default capacity of the lifecycle event broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Lifecycle event names published by the dispatch components
pub mod events {
    /// A signal emission was fanned out into per-receiver delivery units
    pub const SIGNAL_TRIGGERED: &str = "signal.triggered";

    /// A receiver invocation returned successfully
    pub const RECEIVER_SUCCEEDED: &str = "receiver.succeeded";

    /// A receiver invocation failed and will drive a retry
    pub const RECEIVER_FAILED: &str = "receiver.failed";

    /// Every receiver in a chain has finished; no resubmission
    pub const CHAIN_COMPLETED: &str = "chain.completed";

    /// The attempt cap was reached with still-failing receivers
    pub const CHAIN_EXHAUSTED: &str = "chain.exhausted";
}
