#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Signal Relay
//!
//! Queue-backed signal fan-out with per-receiver retry and idempotent
//! completion tracking.
//!
//! ## Overview
//!
//! Signal Relay reliably delivers a named event ("signal") to a set of
//! independently-registered handlers ("receivers") through an asynchronous
//! work queue. A handler that fails transiently is retried with backoff; a
//! handler that has already succeeded is never re-invoked within the same
//! retry chain.
//!
//! ## Architecture
//!
//! An emission is split into one delivery unit per live receiver, so each
//! receiver fails, retries, and converges on its own clock:
//!
//! ```text
//! trigger("order.created", order_42)
//!        │
//!        ├──▶ queue: execute_receivers  target=[email_notify@order_42]
//!        └──▶ queue: execute_receivers  target=[inventory_reserve@order_42]
//!                       │
//!                       ▼ (worker)
//!              RetryController::execute
//!                ├── success ──▶ chain ends
//!                └── failure ──▶ resubmit, finished set carried, backoff
//! ```
//!
//! All retry state (`finished_receivers`, `target_receivers`, the attempt
//! counter) travels inside the message payload: any worker can pick up any
//! attempt of any chain.
//!
//! ## Module Organization
//!
//! - [`registry`] - signal registration and receiver resolution
//! - [`messaging`] - delivery message wire types and the queue boundary
//! - [`dispatch`] - the dispatch coordinator, retry controller, and backoff
//! - [`worker`] - task-name routing for queue consumers
//! - [`config`] - explicit dispatcher configuration
//! - [`error`] - structured error taxonomy
//! - [`events`] - lifecycle event publishing
//! - [`logging`] - structured logging setup and helpers
//!
//! ## Quick Start
//!
//! ```rust
//! use signal_relay::config::DispatcherConfig;
//! use signal_relay::dispatch::DispatchCoordinator;
//! use signal_relay::messaging::InMemoryQueueClient;
//! use signal_relay::registry::SignalRegistry;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), signal_relay::error::SignalRelayError> {
//! let registry = Arc::new(SignalRegistry::new());
//! registry.register_signal("order.created").await;
//!
//! let (queue, _items) = InMemoryQueueClient::channel();
//! let coordinator = DispatchCoordinator::new(
//!     registry,
//!     Arc::new(queue),
//!     DispatcherConfig::default(),
//! );
//!
//! let result = coordinator
//!     .trigger("order.created", "order_42", HashMap::new())
//!     .await?;
//! println!("submitted {} delivery units", result.delivery_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod logging;
pub mod messaging;
pub mod registry;
pub mod worker;

pub use config::DispatcherConfig;
pub use dispatch::{
    BackoffPolicy, DispatchCoordinator, ExecutionOutcome, OutcomeSet, RetryController,
    TriggerResult,
};
pub use error::{Result, SignalRelayError};
pub use events::{DispatchEvent, EventPublisher};
pub use messaging::{DeliveryMessage, DeliveryMetadata, InMemoryQueueClient, QueueClient, QueueItem};
pub use registry::{
    ConnectedReceiver, LookupKey, ReceiverContext, ReceiverResult, Signal, SignalReceiver,
    SignalRegistry, SignalSource,
};
pub use worker::{DeliveryWorker, WorkerOutcome};
