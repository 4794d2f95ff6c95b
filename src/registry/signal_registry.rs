//! # Signal Registry
//!
//! Thread-safe name → [`Signal`] lookup, populated at process start.
//!
//! A miss is a recoverable [`SignalRelayError::UnknownSignal`], not a crash:
//! delivery units travel by name across worker boundaries, and registries
//! can legitimately diverge across deploys. The caller decides whether the
//! miss is fatal for its operation (the Retry Controller treats it as
//! terminal, since retrying cannot fix a missing registration).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, SignalRelayError};
use crate::registry::signal::Signal;

/// Lookup interface injected into the Dispatch Coordinator and Retry
/// Controller.
///
/// Keeping the components behind this seam lets tests and embedders supply
/// their own resolution strategy while the registry itself stays
/// dynamically populated at startup.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Resolve a signal by its stable name
    async fn get_by_name(&self, name: &str) -> Result<Signal>;
}

/// Process-wide registry of named signals
#[derive(Clone, Default)]
pub struct SignalRegistry {
    signals: Arc<RwLock<HashMap<String, Signal>>>,
}

impl SignalRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signal under a stable name, returning its handle.
    ///
    /// Registering an already-known name returns the existing signal, so
    /// startup modules can race without clobbering each other's
    /// connections.
    pub async fn register_signal(&self, name: impl Into<String>) -> Signal {
        let name = name.into();
        let mut signals = self.signals.write().await;

        if let Some(existing) = signals.get(&name) {
            debug!(signal = %name, "Signal already registered");
            return existing.clone();
        }

        let signal = Signal::new(name.clone());
        signals.insert(name.clone(), signal.clone());
        info!(signal = %name, "Registered signal");
        signal
    }

    /// Names of every registered signal
    pub async fn signal_names(&self) -> Vec<String> {
        let signals = self.signals.read().await;
        let mut names: Vec<String> = signals.keys().cloned().collect();
        names.sort();
        names
    }

    /// Registry statistics for observability
    pub async fn stats(&self) -> RegistryStats {
        let signals = self.signals.read().await;
        RegistryStats {
            total_signals: signals.len(),
        }
    }
}

#[async_trait]
impl SignalSource for SignalRegistry {
    async fn get_by_name(&self, name: &str) -> Result<Signal> {
        let signals = self.signals.read().await;
        signals
            .get(name)
            .cloned()
            .ok_or_else(|| SignalRelayError::unknown_signal(name))
    }
}

/// Statistics about registered signals
#[derive(Debug, Clone)]
pub struct RegistryStats {
    pub total_signals: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = SignalRegistry::new();
        registry.register_signal("order.created").await;

        let signal = registry.get_by_name("order.created").await.unwrap();
        assert_eq!(signal.name(), "order.created");
    }

    #[tokio::test]
    async fn test_unknown_signal_is_recoverable_error() {
        let registry = SignalRegistry::new();
        let err = registry.get_by_name("order.shipped").await.unwrap_err();
        assert!(matches!(err, SignalRelayError::UnknownSignal { .. }));
        assert!(err.to_string().contains("order.shipped"));
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let registry = SignalRegistry::new();
        let first = registry.register_signal("order.created").await;
        first
            .connect(
                std::sync::Arc::new(NamedReceiver("email_notify")),
                None,
            )
            .await;

        // A second registration must hand back the same signal, connections
        // included
        let second = registry.register_signal("order.created").await;
        assert_eq!(second.live_receivers("order_42").await.len(), 1);
        assert_eq!(registry.stats().await.total_signals, 1);
    }

    #[tokio::test]
    async fn test_signal_names_sorted() {
        let registry = SignalRegistry::new();
        registry.register_signal("order.shipped").await;
        registry.register_signal("order.created").await;

        assert_eq!(
            registry.signal_names().await,
            vec!["order.created".to_string(), "order.shipped".to_string()]
        );
    }

    struct NamedReceiver(&'static str);

    #[async_trait]
    impl crate::registry::SignalReceiver for NamedReceiver {
        async fn receive(
            &self,
            _sender: &str,
            _context: &crate::registry::ReceiverContext,
        ) -> crate::registry::ReceiverResult {
            Ok(serde_json::Value::Null)
        }

        fn receiver_name(&self) -> &str {
            self.0
        }
    }
}
