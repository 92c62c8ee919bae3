//! Kernel counter sampling from procfs
//!
//! Reads host-wide counters from the proc filesystem:
//! - stat for cumulative CPU ticks
//! - meminfo for installed and available memory

use crate::models::MemoryUsage;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Cumulative CPU tick counts from the aggregate `cpu` line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

impl CpuTimes {
    fn busy(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
    }
}

/// Last observed CPU ticks, used to turn cumulative counters into a percentage
///
/// The all-zero value means no sample has been taken yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuBaseline {
    last: CpuTimes,
}

impl CpuBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a baseline as if `times` had already been sampled
    pub fn from_times(times: CpuTimes) -> Self {
        Self { last: times }
    }

    pub fn is_unset(&self) -> bool {
        self.last == CpuTimes::default()
    }

    pub fn last(&self) -> CpuTimes {
        self.last
    }

    /// Record a new sample and return busy percentage since the previous one
    ///
    /// The first sample only calibrates and returns 0.0.
    pub fn update(&mut self, current: CpuTimes) -> f64 {
        if self.is_unset() {
            self.last = current;
            return 0.0;
        }

        let busy_delta = current.busy().saturating_sub(self.last.busy());
        let idle_delta = current.idle.saturating_sub(self.last.idle);
        let total_delta = busy_delta.saturating_add(idle_delta);

        self.last = current;

        if total_delta == 0 {
            return 0.0;
        }

        (100.0 * busy_delta as f64 / total_delta as f64).clamp(0.0, 100.0)
    }
}

/// Parse the first line of `/proc/stat`
///
/// Layout: `cpu <user> <nice> <system> <idle> ...`. Returns `None` when fewer
/// than four counters are present or any of them is not an integer.
pub fn parse_cpu_line(line: &str) -> Option<CpuTimes> {
    let mut fields = line.split_whitespace().skip(1);
    let mut next = || fields.next()?.parse::<u64>().ok();

    Some(CpuTimes {
        user: next()?,
        nice: next()?,
        system: next()?,
        idle: next()?,
    })
}

/// Parse `/proc/meminfo` contents into whole megabytes
pub fn parse_meminfo(content: &str) -> MemoryUsage {
    let mut total_kb = 0u64;
    let mut available_kb = 0u64;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 2 {
            match parts[0] {
                "MemTotal:" => total_kb = parts[1].parse().unwrap_or(0),
                "MemAvailable:" => available_kb = parts[1].parse().unwrap_or(0),
                _ => {}
            }
        }
    }

    let total_mb = total_kb / 1024;
    MemoryUsage {
        used_mb: total_mb.saturating_sub(available_kb / 1024),
        total_mb,
    }
}

/// Sampler for host CPU usage, owning the baseline between cycles
#[derive(Debug)]
pub struct CpuSampler {
    proc_path: PathBuf,
    baseline: CpuBaseline,
}

impl CpuSampler {
    pub fn new(proc_path: impl Into<PathBuf>) -> Self {
        Self::with_baseline(proc_path, CpuBaseline::new())
    }

    /// Create a sampler with a pre-seeded baseline (for testing)
    pub fn with_baseline(proc_path: impl Into<PathBuf>, baseline: CpuBaseline) -> Self {
        Self {
            proc_path: proc_path.into(),
            baseline,
        }
    }

    pub fn baseline(&self) -> CpuBaseline {
        self.baseline
    }

    /// Sample CPU usage percentage since the previous call
    ///
    /// Read failures yield 0.0 and leave the baseline untouched.
    pub async fn sample(&mut self) -> f64 {
        match read_cpu_times(&self.proc_path).await {
            Ok(times) => {
                let calibrating = self.baseline.is_unset();
                let percent = self.baseline.update(times);
                if calibrating {
                    debug!("CPU baseline established, first sample reports 0%");
                }
                percent
            }
            Err(e) => {
                warn!(error = %e, "Failed to sample CPU counters");
                0.0
            }
        }
    }
}

async fn read_cpu_times(proc_path: &Path) -> Result<CpuTimes> {
    let stat_path = proc_path.join("stat");
    let content = fs::read_to_string(&stat_path)
        .await
        .with_context(|| format!("Failed to read {}", stat_path.display()))?;

    let first_line = content.lines().next().unwrap_or_default();
    parse_cpu_line(first_line)
        .with_context(|| format!("Malformed CPU line in {}", stat_path.display()))
}

/// Read host memory usage; missing or unreadable meminfo yields zeros
pub async fn read_memory(proc_path: &Path) -> MemoryUsage {
    let meminfo_path = proc_path.join("meminfo");
    match fs::read_to_string(&meminfo_path).await {
        Ok(content) => parse_meminfo(&content),
        Err(e) => {
            warn!(path = %meminfo_path.display(), error = %e, "Failed to read meminfo");
            MemoryUsage::default()
        }
    }
}
