//! # Retry Controller
//!
//! Executes one delivery unit: invokes the selected receivers, partitions
//! the outcomes, and either terminates the chain or resubmits the
//! shrinking remainder with backoff.
//!
//! All chain state lives in the message payload. Workers are stateless
//! across attempts, so the cumulative finished-receiver set travels with
//! every resubmission and is merged monotonically: once a lookup key is
//! recorded as finished, no later attempt of that chain re-invokes it.

use std::sync::Arc;
use tracing::{error, info};

use crate::config::DispatcherConfig;
use crate::constants::events;
use crate::dispatch::backoff::BackoffPolicy;
use crate::dispatch::types::{ExecutionOutcome, OutcomeSet};
use crate::error::Result;
use crate::events::EventPublisher;
use crate::logging::{log_retry_scheduled, log_terminal_failure};
use crate::messaging::{DeliveryMessage, QueueClient};
use crate::registry::{LookupKey, SignalSource};

/// Executes delivery units and drives the retry chain
pub struct RetryController {
    signals: Arc<dyn SignalSource>,
    queue: Arc<dyn QueueClient>,
    config: DispatcherConfig,
    backoff: BackoffPolicy,
    events: EventPublisher,
}

impl RetryController {
    /// Create a controller over a signal source and queue client
    pub fn new(
        signals: Arc<dyn SignalSource>,
        queue: Arc<dyn QueueClient>,
        config: DispatcherConfig,
    ) -> Self {
        let backoff = BackoffPolicy::from_config(&config);
        let events = EventPublisher::new(config.event_capacity);
        Self {
            signals,
            queue,
            config,
            backoff,
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
        let backoff = BackoffPolicy::from_config(&config);
        Self {
            signals,
            queue,
            config,
            backoff,
            events,
        }
    }

    /// Execute one delivery unit.
    ///
    /// An unknown signal name is fatal and never retried: registries can
    /// diverge across deploys, and retrying cannot fix a missing
    /// registration. Receiver failures are contained per receiver and
    /// drive a resubmission; a failure to enqueue that resubmission
    /// propagates to the caller so the broker's redelivery applies.
    pub async fn execute(&self, message: DeliveryMessage) -> Result<ExecutionOutcome> {
        let signal = match self.signals.get_by_name(&message.signal_name).await {
            Ok(signal) => signal,
            Err(err) => {
                error!(
                    signal_name = %message.signal_name,
                    sender = %message.sender,
                    "Unknown signal in delivery unit - not retrying"
                );
                return Err(err);
            }
        };

        // Live receivers this unit is NOT responsible for: siblings outside
        // an explicit target set run in chains of their own. They join the
        // finished bookkeeping on resubmit so a re-targeted retry (targets
        // unset = all live receivers) never re-invokes them here.
        let untargeted: Vec<LookupKey> = match &message.target_receivers {
            Some(targets) => signal
                .live_receivers(&message.sender)
                .await
                .into_iter()
                .map(|c| c.lookup_key)
                .filter(|key| !targets.contains(key))
                .collect(),
            None => Vec::new(),
        };

        let context = message.receiver_context();
        let responses = signal.send_robust(&message.sender, &context).await;
        let invoked = responses.len();
        let outcome = OutcomeSet::partition(responses);
        self.publish_receiver_events(&message, &outcome);

        if !outcome.has_failures() {
            let finished_receivers =
                merge_finished(outcome.succeeded_keys(), &message.finished_receivers);
            info!(
                signal_name = %message.signal_name,
                sender = %message.sender,
                attempt = message.metadata.attempt,
                invoked = invoked,
                "Delivery chain completed"
            );
            self.events.publish(
                events::CHAIN_COMPLETED,
                serde_json::json!({
                    "signal_name": message.signal_name,
                    "sender": message.sender,
                    "attempt": message.metadata.attempt,
                    "finished_receivers": finished_receivers,
                }),
            );
            return Ok(ExecutionOutcome::Completed {
                finished_receivers,
                invoked,
            });
        }

        // Monotonic accumulation: everyone who has ever succeeded stays
        // finished, whichever subset this attempt targeted. Untargeted
        // siblings count as finished for this chain, never as failed.
        let mut finished_receivers =
            merge_finished(outcome.succeeded_keys(), &message.finished_receivers);
        for key in untargeted {
            if !finished_receivers.contains(&key) {
                finished_receivers.push(key);
            }
        }

        // The cap rides in the message, stamped at trigger time, so every
        // worker enforces the limit the chain was created with
        if message.is_final_attempt() {
            return self.abandon_chain(&message, &outcome, finished_receivers);
        }

        let delay = self.backoff.delay_for_attempt(message.metadata.attempt);
        let next = message.next_attempt(finished_receivers.clone());
        log_retry_scheduled(
            &self.config.receiver_task_name,
            &message.signal_name,
            &message.sender,
            next.metadata.attempt,
            delay.as_secs(),
            &finished_receivers,
            &outcome.failure_summary(),
        );
        self.queue
            .submit(&self.config.receiver_task_name, &next, Some(delay))
            .await?;

        Ok(ExecutionOutcome::Retried {
            delay,
            finished_receivers,
            next_attempt: next.metadata.attempt,
            failed: outcome.failed.len(),
        })
    }

    /// Terminal exhaustion: record the full chain context before the chain
    /// is abandoned, then surface the error
    fn abandon_chain(
        &self,
        message: &DeliveryMessage,
        outcome: &OutcomeSet,
        finished_receivers: Vec<LookupKey>,
    ) -> Result<ExecutionOutcome> {
        let attempts = message.metadata.attempt + 1;
        log_terminal_failure(
            &self.config.receiver_task_name,
            &message.signal_name,
            &message.sender,
            attempts,
            &finished_receivers,
            &serde_json::json!(message.kwargs),
            &outcome.failure_summary(),
        );
        self.events.publish(
            events::CHAIN_EXHAUSTED,
            serde_json::json!({
                "signal_name": message.signal_name,
                "sender": message.sender,
                "attempts": attempts,
                "finished_receivers": finished_receivers,
                "failures": outcome.failure_summary(),
            }),
        );
        Err(crate::error::SignalRelayError::retry_exhausted(
            &message.signal_name,
            &message.sender,
            attempts,
        ))
    }

    fn publish_receiver_events(&self, message: &DeliveryMessage, outcome: &OutcomeSet) {
        for (key, _) in &outcome.succeeded {
            self.events.publish(
                events::RECEIVER_SUCCEEDED,
                serde_json::json!({
                    "signal_name": message.signal_name,
                    "lookup_key": key,
                    "attempt": message.metadata.attempt,
                }),
            );
        }
        for (key, err) in &outcome.failed {
            self.events.publish(
                events::RECEIVER_FAILED,
                serde_json::json!({
                    "signal_name": message.signal_name,
                    "lookup_key": key,
                    "attempt": message.metadata.attempt,
                    "error": err.to_string(),
                }),
            );
        }
    }

    /// The event publisher, for subscribing to lifecycle events
    pub fn event_publisher(&self) -> &EventPublisher {
        &self.events
    }
}

/// Union of this attempt's successes with the carried finished set,
/// deduplicated, successes first
fn merge_finished(succeeded: Vec<LookupKey>, carried: &[LookupKey]) -> Vec<LookupKey> {
    let mut merged = succeeded;
    for key in carried {
        if !merged.contains(key) {
            merged.push(key.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalRelayError;
    use crate::messaging::InMemoryQueueClient;
    use crate::registry::{ReceiverContext, ReceiverResult, SignalReceiver, SignalRegistry};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Receiver that fails its first `failures` invocations, then succeeds
    struct FlakyReceiver {
        name: String,
        failures: u32,
        invocations: AtomicU32,
    }

    impl FlakyReceiver {
        fn new(name: &str, failures: u32) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                failures,
                invocations: AtomicU32::new(0),
            })
        }

        fn invocations(&self) -> u32 {
            self.invocations.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl SignalReceiver for FlakyReceiver {
        async fn receive(&self, _sender: &str, _context: &ReceiverContext) -> ReceiverResult {
            let attempt = self.invocations.fetch_add(1, Ordering::Relaxed);
            if attempt < self.failures {
                return Err(anyhow::anyhow!("still warming up").into());
            }
            Ok(serde_json::json!({"ok": true}))
        }

        fn receiver_name(&self) -> &str {
            &self.name
        }
    }

    async fn setup(
        receivers: Vec<Arc<FlakyReceiver>>,
        config: DispatcherConfig,
    ) -> (
        RetryController,
        tokio::sync::mpsc::UnboundedReceiver<crate::messaging::QueueItem>,
    ) {
        let registry = Arc::new(SignalRegistry::new());
        let signal = registry.register_signal("order.created").await;
        for receiver in receivers {
            signal.connect(receiver, None).await;
        }
        let (queue, items) = InMemoryQueueClient::channel();
        let controller = RetryController::new(registry, Arc::new(queue), config);
        (controller, items)
    }

    #[tokio::test]
    async fn test_all_success_terminates_chain() {
        let email = FlakyReceiver::new("email_notify", 0);
        let inventory = FlakyReceiver::new("inventory_reserve", 0);
        let (controller, mut items) = setup(
            vec![email.clone(), inventory.clone()],
            DispatcherConfig::default(),
        )
        .await;

        let message = DeliveryMessage::new("order.created", "order_42");
        let outcome = controller.execute(message).await.unwrap();

        match outcome {
            ExecutionOutcome::Completed {
                finished_receivers,
                invoked,
            } => {
                assert_eq!(invoked, 2);
                assert_eq!(finished_receivers.len(), 2);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        // No resubmission
        assert!(items.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_partial_failure_resubmits_with_finished_set() {
        let email = FlakyReceiver::new("email_notify", 0);
        let inventory = FlakyReceiver::new("inventory_reserve", 1);
        let (controller, mut items) = setup(
            vec![email.clone(), inventory.clone()],
            DispatcherConfig::default(),
        )
        .await;

        let message = DeliveryMessage::new("order.created", "order_42");
        let outcome = controller.execute(message).await.unwrap();

        match outcome {
            ExecutionOutcome::Retried {
                delay,
                finished_receivers,
                next_attempt,
                failed,
            } => {
                // First retry follows table entry 0
                assert_eq!(delay, Duration::from_secs(0));
                assert_eq!(next_attempt, 1);
                assert_eq!(failed, 1);
                assert_eq!(
                    finished_receivers,
                    vec![LookupKey::for_pair("email_notify", "order_42")]
                );
            }
            other => panic!("expected retry, got {other:?}"),
        }

        let resubmitted = items.recv().await.unwrap();
        assert_eq!(resubmitted.task_name, "signal_relay.execute_receivers");
        assert!(resubmitted.message.target_receivers.is_none());
        assert_eq!(
            resubmitted.message.finished_receivers,
            vec![LookupKey::for_pair("email_notify", "order_42")]
        );

        // The next attempt must not re-invoke the finished receiver
        controller.execute(resubmitted.message).await.unwrap();
        assert_eq!(email.invocations(), 1);
        assert_eq!(inventory.invocations(), 2);
    }

    #[tokio::test]
    async fn test_targeted_failure_marks_untargeted_siblings_finished() {
        // Per-receiver fan-out: this unit is only responsible for
        // inventory_reserve. Its retry must not pull email_notify back in.
        let email = FlakyReceiver::new("email_notify", 0);
        let inventory = FlakyReceiver::new("inventory_reserve", 1);
        let (controller, mut items) = setup(
            vec![email.clone(), inventory.clone()],
            DispatcherConfig::default(),
        )
        .await;

        let message = DeliveryMessage::new("order.created", "order_42")
            .with_target_receivers(vec![LookupKey::for_pair("inventory_reserve", "order_42")]);
        let outcome = controller.execute(message).await.unwrap();

        match outcome {
            ExecutionOutcome::Retried {
                delay,
                finished_receivers,
                next_attempt,
                ..
            } => {
                assert_eq!(delay, Duration::from_secs(0));
                assert_eq!(next_attempt, 1);
                assert!(finished_receivers
                    .contains(&LookupKey::for_pair("email_notify", "order_42")));
            }
            other => panic!("expected retry, got {other:?}"),
        }
        assert_eq!(email.invocations(), 0);
        assert_eq!(inventory.invocations(), 1);

        // Attempt 1 targets all live receivers but the finished set keeps
        // email_notify out; inventory_reserve converges and the chain ends.
        let resubmitted = items.recv().await.unwrap();
        assert!(resubmitted.message.target_receivers.is_none());
        let outcome = controller.execute(resubmitted.message).await.unwrap();
        assert!(matches!(outcome, ExecutionOutcome::Completed { .. }));
        assert_eq!(email.invocations(), 0);
        assert_eq!(inventory.invocations(), 2);
        assert!(items.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_backoff_delay_grows_with_attempts() {
        let broken = FlakyReceiver::new("inventory_reserve", u32::MAX);
        let (controller, mut items) =
            setup(vec![broken], DispatcherConfig::default()).await;

        let mut message = DeliveryMessage::new("order.created", "order_42");
        message.metadata.attempt = 3;

        let outcome = controller.execute(message).await.unwrap();
        match outcome {
            ExecutionOutcome::Retried { delay, .. } => {
                assert_eq!(delay, Duration::from_secs(6));
            }
            other => panic!("expected retry, got {other:?}"),
        }
        let resubmitted = items.recv().await.unwrap();
        assert_eq!(resubmitted.delay, Some(Duration::from_secs(6)));
        assert_eq!(resubmitted.message.metadata.attempt, 4);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_terminal_failure() {
        let broken = FlakyReceiver::new("inventory_reserve", u32::MAX);
        let config = DispatcherConfig {
            max_attempts: 3,
            ..DispatcherConfig::default()
        };
        let (controller, mut items) = setup(vec![broken], config).await;

        let mut message = DeliveryMessage::new("order.created", "order_42").with_max_attempts(3);
        message.metadata.attempt = 2;

        let err = controller.execute(message).await.unwrap_err();
        match err {
            SignalRelayError::RetryExhausted {
                signal_name,
                sender,
                attempts,
            } => {
                assert_eq!(signal_name, "order.created");
                assert_eq!(sender, "order_42");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected exhaustion, got {other}"),
        }
        // Abandoned chains are not resubmitted
        assert!(items.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_signal_is_fatal() {
        let registry = Arc::new(SignalRegistry::new());
        let (queue, mut items) = InMemoryQueueClient::channel();
        let controller =
            RetryController::new(registry, Arc::new(queue), DispatcherConfig::default());

        let message = DeliveryMessage::new("order.created", "order_42");
        let err = controller.execute(message).await.unwrap_err();
        assert!(matches!(err, SignalRelayError::UnknownSignal { .. }));
        assert!(items.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_resubmission_failure_propagates() {
        let registry = Arc::new(SignalRegistry::new());
        let signal = registry.register_signal("order.created").await;
        signal
            .connect(FlakyReceiver::new("inventory_reserve", u32::MAX), None)
            .await;
        let (queue, items) = InMemoryQueueClient::channel();
        drop(items);
        let controller = RetryController::new(
            registry,
            Arc::new(queue),
            DispatcherConfig::default(),
        );

        let message = DeliveryMessage::new("order.created", "order_42");
        let err = controller.execute(message).await.unwrap_err();
        assert!(matches!(err, SignalRelayError::QueueSubmission { .. }));
    }

    #[test]
    fn test_merge_finished_is_monotonic_and_deduplicated() {
        let succeeded = vec![
            LookupKey::for_pair("email_notify", "order_42"),
            LookupKey::for_pair("audit_log", "order_42"),
        ];
        let carried = vec![
            LookupKey::for_pair("email_notify", "order_42"),
            LookupKey::for_pair("billing_sync", "order_42"),
        ];

        let merged = merge_finished(succeeded, &carried);
        assert_eq!(
            merged,
            vec![
                LookupKey::for_pair("email_notify", "order_42"),
                LookupKey::for_pair("audit_log", "order_42"),
                LookupKey::for_pair("billing_sync", "order_42"),
            ]
        );
    }
}
