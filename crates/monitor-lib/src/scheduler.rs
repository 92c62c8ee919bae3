//! Monitoring loop
//!
//! Drives one collect-format-notify cycle per interval until a shutdown
//! signal arrives. Waiting between cycles is cancellable; a running cycle is
//! always finished before shutdown is honoured.

use crate::collector::SystemMonitor;
use crate::notifier::Notifier;
use crate::observability::StructuredLogger;
use crate::report::{format_detailed, format_shutdown, format_startup, format_summary};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Configuration for the monitoring loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between cycles (default: 30 minutes)
    pub interval: Duration,
    /// Send startup and shutdown announcements (default: true)
    pub announce_lifecycle: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            announce_lifecycle: true,
        }
    }
}

/// Results from a single cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleResults {
    pub summary_sent: bool,
    pub detailed_sent: bool,
    pub send_failures: usize,
}

/// Periodic monitor that reports each cycle through a [`Notifier`]
pub struct MonitorLoop {
    monitor: SystemMonitor,
    notifier: Arc<dyn Notifier>,
    logger: StructuredLogger,
    config: SchedulerConfig,
    cycles: u64,
}

impl MonitorLoop {
    pub fn new(
        monitor: SystemMonitor,
        notifier: Arc<dyn Notifier>,
        logger: StructuredLogger,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            monitor,
            notifier,
            logger,
            config,
            cycles: 0,
        }
    }

    /// Number of cycles started so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run until `shutdown` fires, returning the number of completed cycles
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> u64 {
        info!(
            interval_secs = self.config.interval.as_secs(),
            "Starting monitoring loop"
        );

        if self.config.announce_lifecycle {
            self.announce_startup().await;
        }

        // First tick fires immediately
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Shutdown wins over a tick that became ready during a long cycle
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    info!("Shutting down monitoring loop");
                    break;
                }
                _ = ticker.tick() => {
                    let results = self.run_cycle().await;
                    debug!(
                        cycle = self.cycles,
                        summary_sent = results.summary_sent,
                        detailed_sent = results.detailed_sent,
                        failures = results.send_failures,
                        "Monitoring cycle complete"
                    );
                }
            }
        }

        self.logger.log_shutdown("shutdown signal", self.cycles);
        if self.config.announce_lifecycle {
            let _ = self
                .deliver("shutdown", &format_shutdown(self.cycles))
                .await;
        }

        self.cycles
    }

    /// Test the notifier and, when reachable, announce the monitor
    async fn announce_startup(&self) {
        match self.notifier.test_connection().await {
            Ok(()) => {
                self.logger.log_connection_test(Ok(()));
                let _ = self
                    .deliver("startup", &format_startup(self.config.interval))
                    .await;
            }
            Err(e) => self.logger.log_connection_test(Err(&e)),
        }
    }

    /// Collect one snapshot and send the summary, plus the detailed
    /// container report when the engine has containers
    pub async fn run_cycle(&mut self) -> CycleResults {
        self.cycles += 1;
        let mut results = CycleResults::default();

        let start = Instant::now();
        let snapshot = self.monitor.collect().await;
        self.logger.log_cycle(self.cycles, &snapshot, start.elapsed());

        match self.deliver("summary", &format_summary(&snapshot)).await {
            Ok(()) => results.summary_sent = true,
            Err(_) => results.send_failures += 1,
        }

        if snapshot.engine_active && snapshot.container_count > 0 {
            let containers = self.monitor.list_containers().await;
            if !containers.is_empty() {
                match self.deliver("detailed", &format_detailed(&containers)).await {
                    Ok(()) => results.detailed_sent = true,
                    Err(_) => results.send_failures += 1,
                }
            }
        }

        results
    }

    /// Send one report, logging failures; no retry
    async fn deliver(&self, report: &str, text: &str) -> Result<()> {
        if let Err(e) = self.notifier.send(text).await {
            self.logger.log_delivery_failure(report, &e);
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{
        CommandRunner, DISK_USAGE_COMMAND, ENGINE_STATUS_COMMAND, LIST_CONTAINERS_COMMAND,
    };
    use crate::notifier::NotifyError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct CannedRunner(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl CommandRunner for CannedRunner {
        async fn run(&self, command: &str) -> anyhow::Result<String> {
            Ok(self.0.get(command).copied().unwrap_or_default().to_string())
        }
    }

    /// Notifier that records every message
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail_sends: AtomicBool,
        unreachable: bool,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(NotifyError::Rejected("test failure".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn test_connection(&self) -> Result<(), NotifyError> {
            if self.unreachable {
                Err(NotifyError::Rejected("unreachable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn monitor(engine: &'static str, listing: &'static str) -> SystemMonitor {
        let runner = CannedRunner(HashMap::from([
            (
                DISK_USAGE_COMMAND,
                "Filesystem Size Used Avail Use% Mounted on\n/dev/root 29G 12G 16G 43% /\n",
            ),
            (ENGINE_STATUS_COMMAND, engine),
            (LIST_CONTAINERS_COMMAND, listing),
        ]));
        SystemMonitor::with_sources(Arc::new(runner), "/nonexistent-proc")
    }

    fn monitor_loop(monitor: SystemMonitor, notifier: Arc<RecordingNotifier>) -> MonitorLoop {
        monitor_loop_with(monitor, notifier, true)
    }

    fn monitor_loop_with(
        monitor: SystemMonitor,
        notifier: Arc<RecordingNotifier>,
        announce_lifecycle: bool,
    ) -> MonitorLoop {
        MonitorLoop::new(
            monitor,
            notifier,
            StructuredLogger::new("test-host"),
            SchedulerConfig {
                interval: Duration::from_secs(3600),
                announce_lifecycle,
            },
        )
    }

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert_eq!(config.interval, Duration::from_secs(1800));
        assert!(config.announce_lifecycle);
    }

    #[tokio::test]
    async fn test_cycle_without_engine_sends_summary_only() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut monitor_loop = monitor_loop(monitor("failed\n", ""), notifier.clone());

        let results = monitor_loop.run_cycle().await;

        assert!(results.summary_sent);
        assert!(!results.detailed_sent);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("🐳 <b>Docker Status:</b> Inactive"));
        assert!(sent[0].contains("💾 <b>Disk Usage:</b> 12G / 29G"));
    }

    #[tokio::test]
    async fn test_cycle_with_containers_sends_detailed_report() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut monitor_loop = monitor_loop(
            monitor("active\n", "abc123|web|nginx|Exited (0) 1 hour ago|2024-05-01\n"),
            notifier.clone(),
        );

        let results = monitor_loop.run_cycle().await;

        assert!(results.summary_sent);
        assert!(results.detailed_sent);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[1].starts_with("🐳 <b>Docker Container Report</b>"));
        assert!(sent[1].contains("🏷️ <b>web</b>"));
        assert_eq!(monitor_loop.cycles(), 1);
    }

    #[tokio::test]
    async fn test_cycle_send_failure_is_counted_not_fatal() {
        let notifier = Arc::new(RecordingNotifier::default());
        notifier.fail_sends.store(true, Ordering::SeqCst);
        let mut monitor_loop = monitor_loop(
            monitor("active\n", "abc123|web|nginx|Created|2024-05-01\n"),
            notifier.clone(),
        );

        let results = monitor_loop.run_cycle().await;
        assert_eq!(results.send_failures, 2);

        notifier.fail_sends.store(false, Ordering::SeqCst);
        let results = monitor_loop.run_cycle().await;
        assert_eq!(results.send_failures, 0);
        assert_eq!(monitor_loop.cycles(), 2);
    }

    #[tokio::test]
    async fn test_run_announces_and_stops_on_shutdown() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor_loop = monitor_loop(monitor("failed\n", ""), notifier.clone());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(monitor_loop.run(shutdown_rx));
        // Let the immediate first tick complete
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(()).unwrap();

        let cycles = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(cycles, 1);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 3);
        assert!(sent[0].starts_with("🚀 <b>Docker System Monitor Started</b>"));
        assert!(sent[1].starts_with("🖥️ <b>System Metrics Report</b>"));
        assert!(sent[2].contains("📊 Total monitoring cycles: 1"));
    }

    #[tokio::test]
    async fn test_run_skips_startup_message_when_unreachable() {
        let notifier = Arc::new(RecordingNotifier {
            unreachable: true,
            ..Default::default()
        });
        let monitor_loop = monitor_loop(monitor("failed\n", ""), notifier.clone());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(monitor_loop.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();

        let sent = notifier.sent();
        assert!(!sent.iter().any(|m| m.contains("Monitor Started")));
        assert!(sent[0].starts_with("🖥️ <b>System Metrics Report</b>"));
    }

    #[tokio::test]
    async fn test_pending_shutdown_preempts_ready_tick() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor_loop = monitor_loop(monitor("failed\n", ""), notifier.clone());
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        // The first tick is ready immediately, same as the queued shutdown
        shutdown_tx.send(()).unwrap();
        let cycles = tokio::time::timeout(Duration::from_secs(5), monitor_loop.run(shutdown_rx))
            .await
            .unwrap();

        assert_eq!(cycles, 0);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].starts_with("🚀 <b>Docker System Monitor Started</b>"));
        assert!(sent[1].contains("📊 Total monitoring cycles: 0"));
    }

    #[tokio::test]
    async fn test_run_without_lifecycle_announcements() {
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor_loop =
            monitor_loop_with(monitor("failed\n", ""), notifier.clone(), false);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(monitor_loop.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(()).unwrap();
        let cycles = handle.await.unwrap();

        assert_eq!(cycles, 1);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("🖥️ <b>System Metrics Report</b>"));
    }
}
