//! # Dispatch Engine
//!
//! The dispatch/retry protocol: how a signal emission is split into
//! per-receiver delivery units, how failures are aggregated, how successful
//! receivers are remembered across retry attempts, and how retry timing is
//! computed.
//!
//! ## Components
//!
//! - [`DispatchCoordinator`] - fans an emission out into one delivery unit
//!   per live receiver
//! - [`RetryController`] - executes a delivery unit, partitions outcomes,
//!   and resubmits the shrinking remainder with backoff
//! - [`BackoffPolicy`] - fixed-schedule retry timing, clamped to its last
//!   entry; the attempt cap rides in the message metadata
//!
//! ## Protocol
//!
//! ```text
//! trigger(signal, sender) ──▶ one queue message per live receiver
//!                                    │
//!                                    ▼
//!                        RetryController::execute
//!                          ├── all succeeded ──▶ chain ends
//!                          └── any failed ─────▶ resubmit remainder,
//!                                                finished set carried,
//!                                                delay per backoff table
//! ```
//!
//! Delivery units are independent: each receiver retries on its own clock,
//! and one receiver's failure never re-runs a sibling that already
//! succeeded.

pub mod backoff;
pub mod coordinator;
pub mod retry_controller;
pub mod types;

pub use backoff::BackoffPolicy;
pub use coordinator::DispatchCoordinator;
pub use retry_controller::RetryController;
pub use types::{ExecutionOutcome, OutcomeSet, TriggerResult};
