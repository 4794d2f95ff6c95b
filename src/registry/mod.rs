//! # Signal Registry
//!
//! Process-wide lookup from a signal's stable name to its live set of
//! receivers, resolved at dispatch time.
//!
//! ## Overview
//!
//! Signals are registered once at process start and addressed by name from
//! then on, because delivery units travel by name across process and worker
//! boundaries. Receivers connect to a signal with an optional sender scope
//! and are identified by a [`LookupKey`] derived from registration identity,
//! never from memory addresses, so keys survive serialization into a queue
//! message and comparison against bookkeeping produced by a different
//! process.
//!
//! ## Components
//!
//! - [`SignalReceiver`] - the single capability receivers implement
//! - [`Signal`] - a named event type with an ordered receiver collection
//! - [`SignalRegistry`] - name → [`Signal`] lookup with recoverable misses
//! - [`SignalSource`] - the lookup interface injected into the dispatch
//!   components

pub mod receiver;
pub mod signal;
pub mod signal_registry;

pub use receiver::{LookupKey, ReceiverContext, ReceiverResult, SignalReceiver};
pub use signal::{ConnectedReceiver, Signal};
pub use signal_registry::{RegistryStats, SignalRegistry, SignalSource};
