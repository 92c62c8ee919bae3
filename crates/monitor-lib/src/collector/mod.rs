//! Host and container metrics collection
//!
//! This module gathers one snapshot per monitoring cycle from three sources:
//! kernel counters in procfs, system utilities (`df`, `systemctl`) and the
//! Docker CLI. Every source degrades to a sentinel value instead of failing,
//! so a cycle always produces a complete snapshot.

mod docker;
mod probe;
mod procfs;


pub use docker::{
    parse_container_line, parse_cpu_percent, parse_stats_line, stats_command,
    ContainerInventory, LIST_CONTAINERS_COMMAND,
};
pub use probe::{
    capture, disk_usage, engine_active, parse_disk_usage, parse_engine_status, ShellRunner,
    DISK_USAGE_COMMAND, ENGINE_STATUS_COMMAND,
};
pub use procfs::{parse_cpu_line, parse_meminfo, read_memory, CpuBaseline, CpuSampler, CpuTimes};

use crate::models::{ContainerRecord, Snapshot};
use anyhow::Result;
use chrono::{Local, NaiveDateTime, Timelike};
use std::path::PathBuf;
use std::sync::Arc;

pub use async_trait::async_trait;

/// Capability to run an external command line and capture its stdout
///
/// Implementations return the raw output untrimmed. A non-zero exit status is
/// not an error; only failing to start the command is.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<String>;
}

/// Aggregates all sources into a [`Snapshot`]
///
/// Owns the CPU baseline, so one instance must live for the whole process.
pub struct SystemMonitor {
    runner: Arc<dyn CommandRunner>,
    proc_path: PathBuf,
    cpu: CpuSampler,
    inventory: ContainerInventory,
}

impl SystemMonitor {
    /// Create a monitor over a command runner and a proc root
    ///
    /// Production wiring passes a [`ShellRunner`] and `/proc`.
    pub fn with_sources(runner: Arc<dyn CommandRunner>, proc_path: impl Into<PathBuf>) -> Self {
        let proc_path = proc_path.into();
        Self {
            cpu: CpuSampler::new(proc_path.clone()),
            inventory: ContainerInventory::new(runner.clone()),
            runner,
            proc_path,
        }
    }

    /// Collect one snapshot; every step runs in sequence
    pub async fn collect(&mut self) -> Snapshot {
        let cpu_percent = self.cpu.sample().await;
        let memory = read_memory(&self.proc_path).await;
        let disk = disk_usage(self.runner.as_ref()).await;
        let timestamp = local_timestamp();
        let engine_active = engine_active(self.runner.as_ref()).await;

        let containers = self.inventory.list_containers().await;
        let container_names = containers.into_iter().map(|c| c.name).collect::<Vec<_>>();

        Snapshot {
            cpu_percent,
            memory,
            disk,
            timestamp,
            engine_active,
            container_count: container_names.len(),
            container_names,
        }
    }

    /// Full container inventory for the detailed report
    pub async fn list_containers(&self) -> Vec<ContainerRecord> {
        self.inventory.list_containers().await
    }

    pub fn cpu_baseline(&self) -> CpuBaseline {
        self.cpu.baseline()
    }
}

/// Local civil time truncated to whole seconds
fn local_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
