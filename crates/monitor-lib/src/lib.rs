//! Library for the Docker system monitor
//!
//! This crate provides the core functionality for:
//! - Host metrics collection from procfs and system utilities
//! - Container inventory through the Docker CLI
//! - Report rendering in Telegram HTML
//! - Notification delivery and the periodic monitoring loop

pub mod collector;
pub mod models;
pub mod notifier;
pub mod observability;
pub mod report;
pub mod scheduler;

pub use collector::{CommandRunner, ShellRunner, SystemMonitor};
pub use models::*;
pub use notifier::{Notifier, NotifyError, TelegramConfig, TelegramNotifier};
pub use observability::StructuredLogger;
pub use scheduler::{CycleResults, MonitorLoop, SchedulerConfig};
