//! Report rendering for chat notifications
//!
//! Produces Telegram HTML text: `<b>` spans for labels and literal emoji.
//! All functions are pure.

use crate::models::{ContainerRecord, Snapshot};
use std::fmt::Write;
use std::time::Duration;

/// Number of container names listed in the summary before truncating
pub const SUMMARY_NAME_LIMIT: usize = 5;

/// Reply for an empty inventory
pub const NO_CONTAINERS_MESSAGE: &str =
    "🐳 <b>Docker Container Report</b>\n-------------------\nNo containers found.";

const SEPARATOR: &str = "-------------------";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the per-cycle system summary
pub fn format_summary(snapshot: &Snapshot) -> String {
    let mut message = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(message, "🖥️ <b>System Metrics Report</b>");
    let _ = writeln!(message, "{SEPARATOR}");
    let _ = writeln!(message, "📊 <b>CPU Usage:</b> {:.1}%", snapshot.cpu_percent);
    let _ = writeln!(
        message,
        "🧠 <b>Memory Usage:</b> {}MB / {}MB",
        snapshot.memory.used_mb, snapshot.memory.total_mb
    );
    let _ = writeln!(
        message,
        "💾 <b>Disk Usage:</b> {} / {}",
        escape_html(&snapshot.disk.used),
        escape_html(&snapshot.disk.total)
    );
    let _ = writeln!(
        message,
        "🐳 <b>Docker Status:</b> {}",
        if snapshot.engine_active {
            "Active"
        } else {
            "Inactive"
        }
    );
    let _ = writeln!(
        message,
        "📦 <b>Containers:</b> {} total",
        snapshot.container_count
    );

    if !snapshot.container_names.is_empty() {
        let _ = writeln!(message, "🏷️ <b>Container Names:</b>");
        for name in snapshot.container_names.iter().take(SUMMARY_NAME_LIMIT) {
            let _ = writeln!(message, "   • {}", escape_html(name));
        }
        if snapshot.container_names.len() > SUMMARY_NAME_LIMIT {
            let _ = writeln!(
                message,
                "   • ... and {} more",
                snapshot.container_names.len() - SUMMARY_NAME_LIMIT
            );
        }
    }

    let _ = writeln!(message, "📡 <b>Network:</b> Connected");
    let _ = writeln!(
        message,
        "⏰ <b>Timestamp:</b> {}",
        snapshot.timestamp.format(TIMESTAMP_FORMAT)
    );

    message
}

/// Render the detailed per-container report
pub fn format_detailed(containers: &[ContainerRecord]) -> String {
    if containers.is_empty() {
        return NO_CONTAINERS_MESSAGE.to_string();
    }

    let mut report = String::new();
    let _ = writeln!(report, "🐳 <b>Docker Container Report</b>");
    let _ = writeln!(report, "{SEPARATOR}");
    let _ = writeln!(report, "📦 <b>Total Containers:</b> {}\n", containers.len());

    for container in containers {
        write_container_block(&mut report, container);
    }

    report
}

fn write_container_block(report: &mut String, container: &ContainerRecord) {
    let short_id: String = container.id.chars().take(12).collect();

    let _ = writeln!(report, "🏷️ <b>{}</b>", escape_html(&container.name));
    let _ = writeln!(report, "   📋 ID: {}", escape_html(&short_id));
    let _ = writeln!(report, "   🖼️ Image: {}", escape_html(&container.image));
    let _ = writeln!(report, "   ⚡ Status: {}", escape_html(&container.status));

    if container.is_running() {
        let stats = &container.stats;
        let _ = writeln!(report, "   💻 CPU: {:.1}%", stats.cpu_percent);
        let _ = writeln!(report, "   🧠 Memory: {}", escape_html(&stats.memory_usage));
        let _ = writeln!(report, "   🌐 Network I/O: {}", escape_html(&stats.network_io));
        let _ = writeln!(report, "   💿 Block I/O: {}", escape_html(&stats.block_io));
    }

    let _ = writeln!(report, "   📅 Created: {}", escape_html(&container.created));
    report.push('\n');
}

/// Human-readable monitoring interval, e.g. "30 minutes"
pub fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        0 => format!("{} milliseconds", interval.as_millis()),
        60 => "1 minute".to_string(),
        s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{s} seconds"),
    }
}

/// Announcement sent once the notifier is reachable at startup
pub fn format_startup(interval: Duration) -> String {
    format!(
        "🚀 <b>Docker System Monitor Started</b>\n\
         {SEPARATOR}\n\
         ✅ System monitoring active\n\
         🐳 Docker integration enabled\n\
         📡 Telegram notifications ready\n\
         ⏱️ Monitoring interval: {}\n\n\
         The system will now monitor:\n\
         • CPU and Memory usage\n\
         • Disk space utilization\n\
         • Docker container status\n\
         • Container resource usage",
        describe_interval(interval)
    )
}

/// Farewell sent when the process shuts down
pub fn format_shutdown(cycles: u64) -> String {
    format!(
        "🛑 <b>Docker System Monitor Stopped</b>\n\
         {SEPARATOR}\n\
         ⏹️ Monitoring service has been stopped\n\
         📊 Total monitoring cycles: {cycles}\n\
         👋 Goodbye!"
    )
}
