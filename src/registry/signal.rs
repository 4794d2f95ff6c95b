//! # Signal
//!
//! A named event type owning an ordered collection of receiver connections.
//!
//! Connection order is stable within a process so that explicit
//! `target_receivers` addressing is reproducible between the dispatch pass
//! and later retry attempts. Disconnected receivers stay in the collection
//! (keeping order stable) but are excluded from every live set.
//!
//! `send_robust` invokes each selected receiver inside an isolated result
//! boundary: one receiver's error or panic never prevents the rest of the
//! batch from running.

use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::SignalRelayError;
use crate::registry::receiver::{LookupKey, ReceiverContext, SignalReceiver};

/// One receiver connection within a signal
#[derive(Clone)]
struct ReceiverConnection {
    receiver_name: String,
    /// Sender this connection is scoped to; `None` connects to all senders
    sender_scope: Option<String>,
    receiver: Arc<dyn SignalReceiver>,
    connected: bool,
}

/// A live receiver resolved for a concrete sender
#[derive(Clone)]
pub struct ConnectedReceiver {
    /// Stable address of this (receiver, sender) delivery
    pub lookup_key: LookupKey,
    /// The handler to invoke
    pub receiver: Arc<dyn SignalReceiver>,
}

impl std::fmt::Debug for ConnectedReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedReceiver")
            .field("lookup_key", &self.lookup_key)
            .field("receiver", &"<Arc<dyn SignalReceiver>>".to_string())
            .finish()
    }
}

/// A named event type with an ordered set of registered receivers
#[derive(Clone)]
pub struct Signal {
    name: String,
    connections: Arc<RwLock<Vec<ReceiverConnection>>>,
}

impl Signal {
    /// Create a signal with no connections
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The signal's stable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connect a receiver, optionally scoped to a single sender.
    ///
    /// Reconnecting the same (receiver name, scope) pair replaces the
    /// previous connection in place, preserving its position in the order.
    pub async fn connect(&self, receiver: Arc<dyn SignalReceiver>, sender_scope: Option<&str>) {
        let receiver_name = receiver.receiver_name().to_string();
        let scope = sender_scope.map(str::to_string);
        let mut connections = self.connections.write().await;

        if let Some(existing) = connections
            .iter_mut()
            .find(|c| c.receiver_name == receiver_name && c.sender_scope == scope)
        {
            existing.receiver = receiver;
            existing.connected = true;
            debug!(signal = %self.name, receiver = %receiver_name, "Reconnected receiver");
            return;
        }

        connections.push(ReceiverConnection {
            receiver_name: receiver_name.clone(),
            sender_scope: scope,
            receiver,
            connected: true,
        });
        debug!(signal = %self.name, receiver = %receiver_name, "Connected receiver");
    }

    /// Disconnect a receiver. Returns whether a live connection was found.
    pub async fn disconnect(&self, receiver_name: &str, sender_scope: Option<&str>) -> bool {
        let scope = sender_scope.map(str::to_string);
        let mut connections = self.connections.write().await;

        match connections
            .iter_mut()
            .find(|c| c.receiver_name == receiver_name && c.sender_scope == scope && c.connected)
        {
            Some(connection) => {
                connection.connected = false;
                debug!(signal = %self.name, receiver = %receiver_name, "Disconnected receiver");
                true
            }
            None => false,
        }
    }

    /// Resolve the ordered live receivers for a sender.
    ///
    /// Excludes disconnected receivers and connections scoped to a
    /// different sender. Ordering follows connection order, so repeated
    /// calls within one process are reproducible.
    pub async fn live_receivers(&self, sender: &str) -> Vec<ConnectedReceiver> {
        let connections = self.connections.read().await;
        connections
            .iter()
            .filter(|c| c.connected)
            .filter(|c| match &c.sender_scope {
                Some(scope) => scope == sender,
                None => true,
            })
            .map(|c| ConnectedReceiver {
                lookup_key: LookupKey::for_pair(&c.receiver_name, sender),
                receiver: Arc::clone(&c.receiver),
            })
            .collect()
    }

    /// Invoke the live receivers selected by the context, containing every
    /// per-receiver failure.
    ///
    /// Selection: receivers named by `context.target_receivers` when set,
    /// all live receivers otherwise, always minus any key already in
    /// `context.finished_receivers`. Invocations run sequentially; an error
    /// or panic in one receiver is captured as that receiver's outcome and
    /// the batch continues. No timeout is applied: a receiver that never
    /// returns blocks its attempt indefinitely.
    pub async fn send_robust(
        &self,
        sender: &str,
        context: &ReceiverContext,
    ) -> Vec<(LookupKey, Result<Value, SignalRelayError>)> {
        let selected: Vec<ConnectedReceiver> = self
            .live_receivers(sender)
            .await
            .into_iter()
            .filter(|c| match &context.target_receivers {
                Some(targets) => targets.contains(&c.lookup_key),
                None => true,
            })
            .filter(|c| !context.finished_receivers.contains(&c.lookup_key))
            .collect();

        let mut responses = Vec::with_capacity(selected.len());
        for connected in selected {
            let key = connected.lookup_key.clone();
            let invocation = AssertUnwindSafe(connected.receiver.receive(sender, context))
                .catch_unwind()
                .await;

            let outcome = match invocation {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => {
                    warn!(signal = %self.name, lookup_key = %key, error = %err, "Receiver failed");
                    Err(SignalRelayError::receiver(key.as_str(), err.to_string()))
                }
                Err(panic) => {
                    let message = panic_message(&panic);
                    warn!(signal = %self.name, lookup_key = %key, panic = %message, "Receiver panicked");
                    Err(SignalRelayError::receiver(
                        key.as_str(),
                        format!("receiver panicked: {message}"),
                    ))
                }
            };
            responses.push((key, outcome));
        }
        responses
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("name", &self.name).finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
