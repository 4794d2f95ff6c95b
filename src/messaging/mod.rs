//! # Messaging
//!
//! Wire types for queue-based signal delivery and the queue client
//! boundary.
//!
//! The queue broker itself is an external collaborator: this module defines
//! the [`DeliveryMessage`] payload shape that travels through it and the
//! [`QueueClient`] trait the dispatch components submit through. All retry
//! state rides inside the payload, because no two attempts of the same
//! chain are guaranteed to run in the same worker.

pub mod message;
pub mod queue_client;

pub use message::{DeliveryMessage, DeliveryMetadata};
pub use queue_client::{InMemoryQueueClient, QueueClient, QueueItem};
