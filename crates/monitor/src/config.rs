//! Monitor configuration

use monitor_lib::notifier::{TelegramConfig, DEFAULT_API_BASE_URL};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file used when `MONITOR_CONFIG_PATH` is unset
pub const DEFAULT_CONFIG_PATH: &str = "/etc/docker-system-monitor/config.json";

const CONFIG_PATH_ENV: &str = "MONITOR_CONFIG_PATH";
const ENV_PREFIX: &str = "MONITOR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error(
        "missing required setting `{field}`; {path} should contain:\n\
         {{\n  \"telegram_token\": \"<bot token>\",\n  \"chat_id\": \"<chat id>\"\n}}"
    )]
    MissingCredential { field: &'static str, path: String },
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Telegram bot token
    #[serde(default)]
    pub telegram_token: String,

    /// Destination chat id; numeric ids are accepted as-is
    #[serde(default)]
    pub chat_id: String,

    /// Seconds between monitoring cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Root of the proc filesystem
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,

    /// Telegram Bot API endpoint
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_test_timeout")]
    pub connect_test_timeout_secs: u64,

    /// Host name attached to log events
    #[serde(default = "default_host_name")]
    pub host_name: String,
}

fn default_interval() -> u64 {
    1800
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_test_timeout() -> u64 {
    10
}

fn default_host_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

impl MonitorConfig {
    /// Load configuration from the config file and `MONITOR_*` environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path, None)
    }

    /// Load from `path`, overridden by environment variables
    ///
    /// `env` replaces the process environment when given.
    pub fn load_from(
        path: &Path,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Json)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).source(env))
            .build()?;

        let loaded: MonitorConfig = config.try_deserialize()?;
        loaded.validate(path)?;
        Ok(loaded)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let missing = |field| ConfigError::MissingCredential {
            field,
            path: path.display().to_string(),
        };

        if self.telegram_token.trim().is_empty() {
            return Err(missing("telegram_token"));
        }
        if self.chat_id.trim().is_empty() {
            return Err(missing("chat_id"));
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Settings for the Telegram notifier
    pub fn telegram(&self) -> TelegramConfig {
        let mut telegram = TelegramConfig::new(self.telegram_token.trim(), self.chat_id.trim());
        telegram.api_base_url = self.api_base_url.clone();
        telegram.request_timeout = Duration::from_secs(self.request_timeout_secs);
        telegram.connect_test_timeout = Duration::from_secs(self.connect_test_timeout_secs);
        telegram
    }
}
