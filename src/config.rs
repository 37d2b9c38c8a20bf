//! Configuration management for the booking gateway

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Booking backend the gateway forwards to
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    Remote,
    Local,
}

/// Where schedules, closures and bookings come from
#[derive(Debug, Deserialize, Clone)]
pub struct DataSourceConfig {
    pub mode: DataSourceMode,
    /// JSON fixture file used in local mode
    pub fixtures_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Defaults applied to every tenant
#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    pub slot_interval_minutes: u32,
    pub utc_offset_minutes: i32,
    pub hide_past_slots: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub data_source: DataSourceConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix BARBERBOOK_)
            .add_source(
                Environment::with_prefix("BARBERBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("upstream.base_url", env::var("UPSTREAM_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 3,
        }
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            mode: DataSourceMode::Remote,
            fixtures_path: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-this-secret-in-production".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_interval_minutes: 30,
            utc_offset_minutes: 0,
            hide_past_slots: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            data_source: DataSourceConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            booking: BookingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_matches_built_in_defaults() {
        let from_file: AppConfig = Config::builder()
            .add_source(File::with_name(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default")))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let defaults = AppConfig::default();

        assert_eq!(from_file.server.port, defaults.server.port);
        assert_eq!(from_file.upstream.base_url, defaults.upstream.base_url);
        assert_eq!(from_file.data_source.mode, DataSourceMode::Remote);
        assert_eq!(from_file.booking.slot_interval_minutes, defaults.booking.slot_interval_minutes);
        assert!(from_file.booking.hide_past_slots);
    }
}
