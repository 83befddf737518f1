//! Node configuration loaded from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Node configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Directory service configuration
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Local proxy controller configuration
    #[serde(default)]
    pub control: ControlConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Role lifecycle configuration
    #[serde(default)]
    pub node: NodeConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Directory service URL
    #[serde(default = "default_directory_url")]
    pub base_url: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// How often the proxy list is refreshed
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    /// Local proxy controller URL
    #[serde(default = "default_control_url")]
    pub base_url: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// API listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// API port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Withdraw a registration left over from a previous run
    #[serde(default = "default_true")]
    pub reconcile_on_startup: bool,

    /// Stop serving when the node shuts down
    #[serde(default = "default_true")]
    pub release_on_shutdown: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

// Default implementations
impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_url(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            base_url: default_control_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            reconcile_on_startup: true,
            release_on_shutdown: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_directory_url() -> String {
    "http://localhost:8080".into()
}

fn default_control_url() -> String {
    "http://localhost:50001".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_listen_addr() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8090
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(environment.separator("__").try_parsing(false))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_from(vars: &[(&str, &str)]) -> Result<Config> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_environment(config::Environment::default().source(Some(source)))
    }

    #[test]
    fn test_defaults() {
        let config = load_from(&[]).unwrap();

        assert_eq!(config.directory.base_url, "http://localhost:8080");
        assert_eq!(config.directory.poll_interval, Duration::from_secs(5));
        assert_eq!(config.control.base_url, "http://localhost:50001");
        assert_eq!(config.server.port, 8090);
        assert!(config.node.reconcile_on_startup);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = load_from(&[
            ("DIRECTORY__BASE_URL", "http://dht:8080"),
            ("DIRECTORY__POLL_INTERVAL", "30s"),
            ("CONTROL__TIMEOUT", "2s"),
            ("SERVER__PORT", "9000"),
            ("NODE__RELEASE_ON_SHUTDOWN", "false"),
            ("LOG__FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.directory.base_url, "http://dht:8080");
        assert_eq!(config.directory.poll_interval, Duration::from_secs(30));
        assert_eq!(config.control.timeout, Duration::from_secs(2));
        assert_eq!(config.server.port, 9000);
        assert!(!config.node.release_on_shutdown);
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_duration() {
        assert!(load_from(&[("DIRECTORY__TIMEOUT", "soon")]).is_err());
    }
}
