//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and
//! files, for tracing delivery chains across worker processes.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::registry::LookupKey;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        // Create log directory if it doesn't exist
        let log_dir = PathBuf::from("log");
        if !log_dir.exists() {
            fs::create_dir_all(&log_dir).expect("Failed to create log directory");
        }

        // Generate log file name with environment, PID, and timestamp
        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");
        let log_path = log_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(true)
                    .with_filter(EnvFilter::new(log_level.clone())),
            )
            .with(
                fmt::layer()
                    .with_writer(file_writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_level(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(EnvFilter::new(log_level)),
            );

        // Use try_init to avoid panic if a global subscriber already exists
        // (embedding applications often install their own)
        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "🔧 STRUCTURED LOGGING: Initialized with file output"
        );

        // Keep the appender guard alive for the life of the process
        std::mem::forget(guard);
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("SIGNAL_RELAY_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for dispatch operations
pub fn log_dispatch_operation(
    operation: &str,
    task_name: &str,
    signal_name: &str,
    sender: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        task_name = %task_name,
        signal_name = %signal_name,
        sender = %sender,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📡 DISPATCH_OPERATION"
    );
}

/// Log a scheduled retry with the cumulative finished-receiver set
pub fn log_retry_scheduled(
    task_name: &str,
    signal_name: &str,
    sender: &str,
    attempt: u32,
    delay_seconds: u64,
    finished_receivers: &[LookupKey],
    failures: &str,
) {
    tracing::warn!(
        task_name = %task_name,
        signal_name = %signal_name,
        sender = %sender,
        attempt = attempt,
        delay_seconds = delay_seconds,
        finished_receivers = ?finished_receivers,
        failures = %failures,
        timestamp = %Utc::now().to_rfc3339(),
        "🔁 RETRY_SCHEDULED"
    );
}

/// Log a terminal failure with full chain context before it is abandoned,
/// so an operator can diagnose which receiver never converged
pub fn log_terminal_failure(
    task_name: &str,
    signal_name: &str,
    sender: &str,
    attempts: u32,
    finished_receivers: &[LookupKey],
    kwargs: &serde_json::Value,
    failures: &str,
) {
    tracing::error!(
        task_name = %task_name,
        signal_name = %signal_name,
        sender = %sender,
        attempts = attempts,
        finished_receivers = ?finished_receivers,
        kwargs = %kwargs,
        failures = %failures,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ TERMINAL_FAILURE"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_detection() {
        std::env::set_var("SIGNAL_RELAY_ENV", "test_override");
        let env = get_environment();
        assert_eq!(env, "test_override");
        std::env::remove_var("SIGNAL_RELAY_ENV");
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("unknown"), "debug");
    }
}
