//! Shared test receivers for integration scenarios.

use async_trait::async_trait;
use signal_relay::registry::{ReceiverContext, ReceiverResult, SignalReceiver};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Receiver that always succeeds, counting its invocations
pub struct CountingReceiver {
    name: String,
    invocations: AtomicU32,
}

impl CountingReceiver {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            invocations: AtomicU32::new(0),
        })
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SignalReceiver for CountingReceiver {
    async fn receive(&self, _sender: &str, _context: &ReceiverContext) -> ReceiverResult {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        Ok(serde_json::json!({"handled_by": self.name}))
    }

    fn receiver_name(&self) -> &str {
        &self.name
    }
}

/// Receiver that fails its first `failures` invocations, then succeeds
pub struct FlakyReceiver {
    name: String,
    failures: u32,
    invocations: AtomicU32,
}

impl FlakyReceiver {
    pub fn new(name: &str, failures: u32) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            failures,
            invocations: AtomicU32::new(0),
        })
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SignalReceiver for FlakyReceiver {
    async fn receive(&self, _sender: &str, _context: &ReceiverContext) -> ReceiverResult {
        let attempt = self.invocations.fetch_add(1, Ordering::Relaxed);
        if attempt < self.failures {
            return Err(anyhow::anyhow!("dependency unavailable").into());
        }
        Ok(serde_json::json!({"handled_by": self.name}))
    }

    fn receiver_name(&self) -> &str {
        &self.name
    }
}
