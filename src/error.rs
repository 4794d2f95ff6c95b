//! # Dispatch Error Types
//!
//! Structured error handling for signal dispatch using thiserror,
//! instead of `Box<dyn Error>` patterns.
//!
//! The taxonomy separates failures by how they propagate:
//!
//! - [`SignalRelayError::UnknownSignal`] is fatal and never retried — a
//!   delivery unit naming an unregistered signal cannot be fixed by retrying.
//! - [`SignalRelayError::Receiver`] is recoverable and drives the retry path.
//! - [`SignalRelayError::QueueSubmission`] surfaces to the immediate caller;
//!   the queue client's own delivery guarantees apply, this layer does not
//!   retry submissions.
//! - [`SignalRelayError::RetryExhausted`] is terminal, raised once the
//!   attempt cap is reached with still-failing receivers.

use thiserror::Error;

/// Error taxonomy for signal dispatch and retry
#[derive(Error, Debug)]
pub enum SignalRelayError {
    #[error("Unknown signal: no signal registered under name '{signal_name}'")]
    UnknownSignal { signal_name: String },

    #[error("Receiver '{lookup_key}' failed: {message}")]
    Receiver { lookup_key: String, message: String },

    #[error("Queue submission failed for task '{task_name}': {message}")]
    QueueSubmission { task_name: String, message: String },

    #[error("Retry exhausted for signal '{signal_name}' from '{sender}' after {attempts} attempts")]
    RetryExhausted {
        signal_name: String,
        sender: String,
        attempts: u32,
    },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },

    #[error("Message serialization error: {message}")]
    Serialization { message: String },
}

impl SignalRelayError {
    /// Create an unknown signal error
    pub fn unknown_signal(signal_name: impl Into<String>) -> Self {
        Self::UnknownSignal {
            signal_name: signal_name.into(),
        }
    }

    /// Create a receiver failure error
    pub fn receiver(lookup_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Receiver {
            lookup_key: lookup_key.into(),
            message: message.into(),
        }
    }

    /// Create a queue submission error
    pub fn queue_submission(task_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueueSubmission {
            task_name: task_name.into(),
            message: message.into(),
        }
    }

    /// Create a retry exhausted error
    pub fn retry_exhausted(
        signal_name: impl Into<String>,
        sender: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self::RetryExhausted {
            signal_name: signal_name.into(),
            sender: sender.into(),
            attempts,
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error should ever be retried by the dispatch layer
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Receiver { .. })
    }
}

/// Conversion from serde_json::Error to SignalRelayError
impl From<serde_json::Error> for SignalRelayError {
    fn from(err: serde_json::Error) -> Self {
        SignalRelayError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, SignalRelayError>;
