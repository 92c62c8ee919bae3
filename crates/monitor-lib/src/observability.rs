//! Structured lifecycle logging for the monitor
//!
//! Every event carries an `event` name and the `host` it was emitted on so
//! the JSON log stream can be filtered without parsing messages.

use crate::models::Snapshot;
use std::time::Duration;
use tracing::{error, info, warn};

/// Structured logger for monitor events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    host: String,
}

impl StructuredLogger {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Log monitor startup
    pub fn log_startup(&self, version: &str, interval: Duration) {
        info!(
            event = "monitor_started",
            host = %self.host,
            version = %version,
            interval_secs = interval.as_secs(),
            "Docker system monitor started"
        );
    }

    /// Log the outcome of the startup connection test
    pub fn log_connection_test(&self, result: Result<(), &dyn std::error::Error>) {
        match result {
            Ok(()) => info!(
                event = "notifier_connected",
                host = %self.host,
                "Notification endpoint reachable"
            ),
            Err(e) => warn!(
                event = "notifier_unreachable",
                host = %self.host,
                error = %e,
                "Notification endpoint test failed, messages may not be delivered"
            ),
        }
    }

    /// Log the metrics gathered in one cycle
    pub fn log_cycle(&self, cycle: u64, snapshot: &Snapshot, elapsed: Duration) {
        info!(
            event = "cycle_collected",
            host = %self.host,
            cycle = cycle,
            cpu_percent = snapshot.cpu_percent,
            memory_known = !snapshot.memory.is_unknown(),
            memory_used_mb = snapshot.memory.used_mb,
            memory_total_mb = snapshot.memory.total_mb,
            disk_used = %snapshot.disk.used,
            disk_total = %snapshot.disk.total,
            engine_active = snapshot.engine_active,
            containers = snapshot.container_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "System metrics collected"
        );
    }

    /// Log a failed delivery; the cycle carries on
    pub fn log_delivery_failure(&self, report: &str, err: &dyn std::error::Error) {
        error!(
            event = "delivery_failed",
            host = %self.host,
            report = %report,
            error = %err,
            "Failed to send report"
        );
    }

    /// Log monitor shutdown
    pub fn log_shutdown(&self, reason: &str, cycles: u64) {
        info!(
            event = "monitor_shutdown",
            host = %self.host,
            reason = %reason,
            cycles = cycles,
            "Docker system monitor shutting down"
        );
    }
}
