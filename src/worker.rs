//! # Delivery Worker
//!
//! Routes queue work items to the dispatch components by task name: the
//! trigger task fans out, the receiver task executes and retries.
//!
//! Acknowledgement is late: an item is only considered done after its
//! outcome is fully determined and any resubmission has been enqueued, so a
//! worker crash mid-attempt leads to broker redelivery rather than silent
//! loss. With the in-memory queue the channel recv is the ack; an external
//! broker integration acks after [`DeliveryWorker::handle`] returns.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::DispatcherConfig;
use crate::dispatch::{DispatchCoordinator, ExecutionOutcome, RetryController, TriggerResult};
use crate::error::{Result, SignalRelayError};
use crate::messaging::{DeliveryMessage, QueueItem};

/// Outcome of handling one queue work item
#[derive(Debug)]
pub enum WorkerOutcome {
    /// The trigger task fanned an emission out into delivery units
    Triggered(TriggerResult),
    /// The receiver task executed a delivery unit
    Executed(ExecutionOutcome),
}

/// Consumes queue work items and drives the dispatch components
pub struct DeliveryWorker {
    config: DispatcherConfig,
    coordinator: Arc<DispatchCoordinator>,
    controller: Arc<RetryController>,
}

impl DeliveryWorker {
    /// Create a worker routing to the given components
    pub fn new(
        config: DispatcherConfig,
        coordinator: Arc<DispatchCoordinator>,
        controller: Arc<RetryController>,
    ) -> Self {
        Self {
            config,
            coordinator,
            controller,
        }
    }

    /// Handle one work item, routed by task name.
    ///
    /// Unknown task names are a configuration error: reported to the
    /// caller, never a crash.
    pub async fn handle(&self, task_name: &str, message: DeliveryMessage) -> Result<WorkerOutcome> {
        if task_name == self.config.trigger_task_name {
            let result = self
                .coordinator
                .trigger(&message.signal_name, &message.sender, message.kwargs)
                .await?;
            return Ok(WorkerOutcome::Triggered(result));
        }

        if task_name == self.config.receiver_task_name {
            let outcome = self.controller.execute(message).await?;
            return Ok(WorkerOutcome::Executed(outcome));
        }

        warn!(task_name = %task_name, "Received work item for unknown task name");
        Err(SignalRelayError::configuration(
            "worker",
            format!("no handler registered for task '{task_name}'"),
        ))
    }

    /// Process items until the queue channel closes.
    ///
    /// Submission delays are slept off here because the in-memory queue has
    /// no visibility timeout; an external broker applies them at the
    /// transport instead. Terminal failures are already recorded by the
    /// Retry Controller, so the loop logs and moves on.
    pub async fn run(&self, items: &mut mpsc::UnboundedReceiver<QueueItem>) {
        info!(
            trigger_task = %self.config.trigger_task_name,
            receiver_task = %self.config.receiver_task_name,
            "Delivery worker started"
        );

        while let Some(item) = items.recv().await {
            if let Some(delay) = item.delay {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            match self.handle(&item.task_name, item.message).await {
                Ok(_) => {}
                Err(err) => {
                    error!(
                        task_name = %item.task_name,
                        message_id = item.message_id,
                        error = %err,
                        "Work item failed"
                    );
                }
            }
        }

        info!("Delivery worker stopped - queue channel closed");
    }
}
