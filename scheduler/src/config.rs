//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use fxwatch_common::{constants, DurationExt};
use fxwatch_fx::provider::{BASE_PLACEHOLDER, DEFAULT_ENDPOINT_TEMPLATE};
use fxwatch_fx::{HttpProviderConfig, RefreshEngineConfig};

use crate::store::JsonConfigStore;

/// Main service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path of the pair/alarm JSON file.
    pub config_path: PathBuf,
    /// Interval between scheduled refresh cycles.
    pub refresh_interval: Duration,
    /// Minimum time between notifications for one trigger signature.
    pub alarm_cooldown: Duration,
    /// Rate endpoint URL template containing `{base}`.
    pub endpoint_template: String,
    /// Upper bound for one rate request.
    pub request_timeout: Duration,
    /// External program invoked as `<program> <title> <message>` per alarm.
    pub notify_command: Option<String>,
    /// Log level.
    pub log_level: String,
    /// Emit JSON log lines.
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_path: JsonConfigStore::default_path(),
            refresh_interval: constants::refresh_interval().as_std(),
            alarm_cooldown: constants::alarm_cooldown().as_std(),
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
            request_timeout: constants::request_timeout().as_std(),
            notify_command: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("FXWATCH_CONFIG") {
            config.config_path = PathBuf::from(path);
        }

        if let Some(secs) = env_secs("FXWATCH_INTERVAL_SECS") {
            config.refresh_interval = secs;
        }

        if let Some(secs) = env_secs("FXWATCH_COOLDOWN_SECS") {
            config.alarm_cooldown = secs;
        }

        if let Ok(template) = std::env::var("FXWATCH_ENDPOINT") {
            config.endpoint_template = template;
        }

        if let Some(secs) = env_secs("FXWATCH_TIMEOUT_SECS") {
            config.request_timeout = secs;
        }

        if let Ok(cmd) = std::env::var("FXWATCH_NOTIFY_CMD") {
            if !cmd.trim().is_empty() {
                config.notify_command = Some(cmd);
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config.log_json = std::env::var("FXWATCH_LOG_JSON").is_ok();

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.refresh_interval.is_zero() {
            return Err("Refresh interval cannot be zero".to_string());
        }

        if self.request_timeout.is_zero() {
            return Err("Request timeout cannot be zero".to_string());
        }

        if !self.endpoint_template.contains(BASE_PLACEHOLDER) {
            return Err(format!(
                "Endpoint template must contain {}",
                BASE_PLACEHOLDER
            ));
        }

        Ok(())
    }

    /// Settings for the HTTP rate provider.
    pub fn provider_config(&self) -> HttpProviderConfig {
        HttpProviderConfig {
            endpoint_template: self.endpoint_template.clone(),
            request_timeout: self.request_timeout,
        }
    }

    /// Settings for the refresh engine.
    pub fn engine_config(&self) -> RefreshEngineConfig {
        RefreshEngineConfig {
            alarm_cooldown: chrono::Duration::from_std(self.alarm_cooldown)
                .unwrap_or_else(|_| constants::alarm_cooldown()),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
