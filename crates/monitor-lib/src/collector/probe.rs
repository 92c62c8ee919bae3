//! External command probes
//!
//! Shells out to system utilities and parses their text output. Every probe
//! degrades to a documented sentinel when the command produces nothing.

use super::CommandRunner;
use crate::models::DiskUsage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

/// Root filesystem usage in human-readable units, POSIX layout (no wrapping)
pub const DISK_USAGE_COMMAND: &str = "df -hP /";

/// Service state query for the container engine
pub const ENGINE_STATUS_COMMAND: &str = "systemctl is-active docker 2>/dev/null";

/// Runs command lines through `sh -c` and captures stdout
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<String> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .with_context(|| format!("Failed to spawn `{}`", command))?;

        if !output.status.success() {
            debug!(command, status = %output.status, "Command exited unsuccessfully");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Run a command, mapping a spawn failure to empty output
pub async fn capture(runner: &dyn CommandRunner, command: &str) -> String {
    match runner.run(command).await {
        Ok(output) => output,
        Err(e) => {
            warn!(command, error = %e, "Probe failed");
            String::new()
        }
    }
}

/// Parse `df` output into (used, size)
///
/// Skips the header and splits the first data row into
/// filesystem, size, used, available, percent and mountpoint.
pub fn parse_disk_usage(output: &str) -> DiskUsage {
    let row = output
        .lines()
        .skip(1)
        .find(|line| !line.trim().is_empty());

    let fields: Vec<&str> = row
        .map(|line| line.split_whitespace().collect())
        .unwrap_or_default();

    if fields.len() < 6 {
        return DiskUsage::unavailable();
    }

    DiskUsage {
        used: fields[2].to_string(),
        total: fields[1].to_string(),
    }
}

/// Whether a service-status output mentions `active`
///
/// This is a plain substring test, so `inactive` and `activating` also count
/// as running; callers should not rely on it to detect a stopped engine.
pub fn parse_engine_status(output: &str) -> bool {
    output.contains("active")
}

/// Probe root filesystem usage
pub async fn disk_usage(runner: &dyn CommandRunner) -> DiskUsage {
    let output = capture(runner, DISK_USAGE_COMMAND).await;
    if output.is_empty() {
        return DiskUsage::unavailable();
    }
    parse_disk_usage(&output)
}

/// Probe whether the container engine service is running
pub async fn engine_active(runner: &dyn CommandRunner) -> bool {
    parse_engine_status(&capture(runner, ENGINE_STATUS_COMMAND).await)
}
