//! Core data models for the system monitor

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Placeholder used for byte-pair stats when a container has no live stats
pub const NO_IO: &str = "0B / 0B";

/// Placeholder used for disk figures when the usage probe yields nothing
pub const NOT_AVAILABLE: &str = "N/A";

/// Aggregate of all host metrics gathered during one monitoring cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cpu_percent: f64,
    pub memory: MemoryUsage,
    pub disk: DiskUsage,
    pub timestamp: NaiveDateTime,
    pub engine_active: bool,
    pub container_count: usize,
    pub container_names: Vec<String>,
}

/// Host memory in whole megabytes
///
/// `used_mb == total_mb == 0` means the kernel figures were unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub used_mb: u64,
    pub total_mb: u64,
}

impl MemoryUsage {
    pub fn is_unknown(&self) -> bool {
        self.total_mb == 0
    }
}

/// Root filesystem usage as reported by `df`, in its own human-readable units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub used: String,
    pub total: String,
}

impl DiskUsage {
    pub fn unavailable() -> Self {
        Self {
            used: NOT_AVAILABLE.to_string(),
            total: NOT_AVAILABLE.to_string(),
        }
    }
}

/// One container as listed by the engine, plus live stats when running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub created: String,
    pub stats: ContainerStats,
}

impl ContainerRecord {
    /// Running-state heuristic on the engine's status text ("Up 2 hours")
    pub fn is_running(&self) -> bool {
        status_is_running(&self.status)
    }
}

pub(crate) fn status_is_running(status: &str) -> bool {
    status.contains("Up")
}

/// Live resource stats for a single container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    pub cpu_percent: f64,
    pub memory_usage: String,
    pub network_io: String,
    pub block_io: String,
}

impl Default for ContainerStats {
    fn default() -> Self {
        Self {
            cpu_percent: 0.0,
            memory_usage: NO_IO.to_string(),
            network_io: NO_IO.to_string(),
            block_io: NO_IO.to_string(),
        }
    }
}
