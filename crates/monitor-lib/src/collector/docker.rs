//! Container inventory through the Docker CLI
//!
//! Enumerates all containers with `docker ps -a` and, for the running ones,
//! fetches a single live sample with `docker stats --no-stream`. Both commands
//! emit pipe-delimited rows; field values must not contain the delimiter.

use super::probe::{capture, engine_active};
use super::CommandRunner;
use crate::models::{status_is_running, ContainerRecord, ContainerStats};
use std::sync::Arc;
use tracing::{debug, info};

/// Enumeration command: id|name|image|status|created per line
pub const LIST_CONTAINERS_COMMAND: &str = "docker ps -a --format \"{{.ID}}|{{.Names}}|{{.Image}}|{{.Status}}|{{.CreatedAt}}\" 2>/dev/null";

const STATS_FORMAT: &str = "{{.CPUPerc}}|{{.MemUsage}}|{{.NetIO}}|{{.BlockIO}}";

/// Build the per-container stats command: cpu%|mem|net|block
pub fn stats_command(container_id: &str) -> String {
    format!(
        "docker stats --no-stream --format \"{}\" {} 2>/dev/null",
        STATS_FORMAT, container_id
    )
}

/// Parse one `docker ps` row into a record with placeholder stats
///
/// Returns `None` for blank lines. Missing trailing fields become empty.
pub fn parse_container_line(line: &str) -> Option<ContainerRecord> {
    if line.trim().is_empty() {
        return None;
    }

    let mut fields = line.split('|');
    let mut next = || fields.next().unwrap_or_default().to_string();

    Some(ContainerRecord {
        id: next(),
        name: next(),
        image: next(),
        status: next(),
        created: next(),
        stats: ContainerStats::default(),
    })
}

/// Parse `docker stats` output into stats, defaulting each unusable field
pub fn parse_stats_line(output: &str) -> ContainerStats {
    let line = output
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();
    if line.is_empty() {
        return ContainerStats::default();
    }

    let defaults = ContainerStats::default();
    let mut fields = line.split('|').map(str::trim);

    let cpu_percent = fields.next().map(parse_cpu_percent).unwrap_or(0.0);
    let mut text_or = |fallback: String| {
        fields
            .next()
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback)
    };

    ContainerStats {
        cpu_percent,
        memory_usage: text_or(defaults.memory_usage),
        network_io: text_or(defaults.network_io),
        block_io: text_or(defaults.block_io),
    }
}

/// Parse a CPU field such as `12.3%`; anything unparsable is 0.0
pub fn parse_cpu_percent(field: &str) -> f64 {
    let value = field.trim().trim_end_matches('%').trim();
    match value.parse::<f64>() {
        Ok(percent) if percent.is_finite() => percent,
        _ => {
            debug!(field, "Unparsable container CPU field, using 0");
            0.0
        }
    }
}

/// Container ids go straight into a shell command line, so only plain
/// alphanumeric ids are accepted
fn is_safe_container_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Collector that lists containers and their live stats
pub struct ContainerInventory {
    runner: Arc<dyn CommandRunner>,
}

impl ContainerInventory {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// List all containers in engine order, with stats for running ones
    ///
    /// Returns an empty list without enumerating when the engine is inactive.
    pub async fn list_containers(&self) -> Vec<ContainerRecord> {
        if !engine_active(self.runner.as_ref()).await {
            debug!("Container engine inactive, skipping enumeration");
            return Vec::new();
        }

        let listing = capture(self.runner.as_ref(), LIST_CONTAINERS_COMMAND).await;
        let mut containers = Vec::new();

        for mut record in listing.lines().filter_map(parse_container_line) {
            if status_is_running(&record.status) {
                record.stats = self.fetch_stats(&record.id).await;
            }
            containers.push(record);
        }

        info!(count = containers.len(), "Enumerated containers");
        containers
    }

    async fn fetch_stats(&self, container_id: &str) -> ContainerStats {
        if !is_safe_container_id(container_id) {
            debug!(container_id, "Skipping stats for unexpected container id");
            return ContainerStats::default();
        }

        let output = capture(self.runner.as_ref(), &stats_command(container_id)).await;
        parse_stats_line(&output)
    }
}
