//! # Dispatch Coordinator
//!
//! Splits a signal emission into per-receiver delivery units.
//!
//! One queue message per live receiver bounds the blast radius of a single
//! receiver's failure and gives each receiver its own backoff clock; a
//! shared unit would re-run already-succeeded receivers on every retry.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DispatcherConfig;
use crate::constants::events;
use crate::dispatch::types::TriggerResult;
use crate::error::Result;
use crate::events::EventPublisher;
use crate::messaging::{DeliveryMessage, QueueClient};
use crate::registry::SignalSource;

/// Fans signal emissions out into per-receiver delivery units
pub struct DispatchCoordinator {
    signals: Arc<dyn SignalSource>,
    queue: Arc<dyn QueueClient>,
    config: DispatcherConfig,
    events: EventPublisher,
}

impl DispatchCoordinator {
    /// Create a coordinator over a signal source and queue client
    pub fn new(
        signals: Arc<dyn SignalSource>,
        queue: Arc<dyn QueueClient>,
        config: DispatcherConfig,
    ) -> Self {
        let events = EventPublisher::new(config.event_capacity);
        Self {
            signals,
            queue,
            config,
            events,
        }
    }

    /// Create with a shared event publisher
    pub fn with_event_publisher(
        signals: Arc<dyn SignalSource>,
        queue: Arc<dyn QueueClient>,
        config: DispatcherConfig,
        events: EventPublisher,
    ) -> Self {
        Self {
            signals,
            queue,
            config,
            events,
        }
    }

    /// Emit a signal: submit one delivery unit per live receiver.
    ///
    /// Each unit is addressed to exactly one lookup key via
    /// `target_receivers`. A signal with zero live receivers submits
    /// nothing and completes without error. No local state is mutated;
    /// a queue submission failure surfaces to the caller and is not
    /// retried here.
    pub async fn trigger(
        &self,
        signal_name: &str,
        sender: &str,
        kwargs: HashMap<String, Value>,
    ) -> Result<TriggerResult> {
        let signal = self.signals.get_by_name(signal_name).await?;
        let live = signal.live_receivers(sender).await;

        let mut submitted = Vec::with_capacity(live.len());
        for connected in live {
            let message = DeliveryMessage::new(signal_name, sender)
                .with_kwargs(kwargs.clone())
                .with_target_receivers(vec![connected.lookup_key.clone()])
                .with_max_attempts(self.config.max_attempts);

            let message_id = self
                .queue
                .submit(&self.config.receiver_task_name, &message, None)
                .await?;

            debug!(
                signal_name = %signal_name,
                sender = %sender,
                lookup_key = %connected.lookup_key,
                message_id = message_id,
                "Submitted delivery unit"
            );
            submitted.push(connected.lookup_key);
        }

        info!(
            signal_name = %signal_name,
            sender = %sender,
            delivery_count = submitted.len(),
            "Triggered signal"
        );
        self.events.publish(
            events::SIGNAL_TRIGGERED,
            serde_json::json!({
                "signal_name": signal_name,
                "sender": sender,
                "delivery_count": submitted.len(),
            }),
        );

        Ok(TriggerResult {
            signal_name: signal_name.to_string(),
            sender: sender.to_string(),
            submitted,
        })
    }

    /// The event publisher, for subscribing to lifecycle events
    pub fn event_publisher(&self) -> &EventPublisher {
        &self.events
    }
}
