//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: USERS_, nested keys separated by `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/users-service/config.toml
//! 4. System directory: /etc/users-service/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "USERS_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Pagination defaults for list endpoints
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// HTTP surface configuration
    #[serde(default)]
    pub http: HttpConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level or `EnvFilter` directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Document store configuration
///
/// `url` selects the driver by scheme: `mongodb://` / `mongodb+srv://` use the
/// MongoDB driver, `mem://` uses the in-process store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Database name
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection holding user documents
    #[serde(default = "default_users_collection")]
    pub users_collection: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound for a single store round-trip in seconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    /// Maximum retry attempts for establishing the store connection
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between connection attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            database: default_database(),
            users_collection: default_users_collection(),
            connect_timeout_secs: default_connect_timeout(),
            operation_timeout_secs: default_operation_timeout(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl StoreConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Get per-operation timeout as Duration
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Whether the URL selects the in-memory store
    pub fn is_memory(&self) -> bool {
        self.url.starts_with("mem://")
    }
}

/// Pagination defaults
///
/// Zero or absent `page` / `limit` query values are replaced by these defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page used when the request carries none (1-indexed)
    #[serde(default = "default_page")]
    pub default_page: u32,

    /// Limit used when the request carries none
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Optional ceiling applied to requested limits
    #[serde(default)]
    pub max_limit: Option<u32>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: default_page(),
            default_limit: default_limit(),
            max_limit: None,
        }
    }
}

/// HTTP surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request body size limit in MB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// CORS configuration (permissive, restrictive, disabled)
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,

    /// Render every failure as 400 Bad Request instead of kind-specific codes
    #[serde(default)]
    pub collapse_error_status: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            body_limit_mb: default_body_limit_mb(),
            cors_mode: default_cors_mode(),
            collapse_error_status: false,
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_store_url() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "users".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_operation_timeout() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

fn default_body_limit_mb() -> usize {
    1
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Searches for config files in this order (first found wins on conflicts):
    /// 1. Current working directory: ./config.toml
    /// 2. XDG config directory: ~/.config/users-service/config.toml
    /// 3. System directory: /etc/users-service/config.toml
    ///
    /// Environment variables (USERS_ prefix) override all file-based configs.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so that higher priority files override
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the XDG and system directories. Environment variables still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Find all possible config file paths, highest priority first
    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("users-service");
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths.push(PathBuf::from("/etc/users-service/config.toml"));

        paths
    }

    /// Request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "users-service".to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
            store: StoreConfig::default(),
            pagination: PaginationConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.pagination.default_page, 1);
        assert_eq!(config.pagination.default_limit, 10);
        assert!(config.pagination.max_limit.is_none());
        assert!(!config.http.collapse_error_status);
        assert!(!config.store.is_memory());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[service]
name = "users-test"
port = 9999

[store]
url = "mem://"
users_collection = "people"

[pagination]
default_limit = 25
max_limit = 50
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.service.name, "users-test");
        assert_eq!(config.service.port, 9999);
        assert_eq!(config.service.log_level, "info");
        assert!(config.store.is_memory());
        assert_eq!(config.store.users_collection, "people");
        assert_eq!(config.store.database, "users");
        assert_eq!(config.pagination.default_limit, 25);
        assert_eq!(config.pagination.max_limit, Some(50));
    }

    #[test]
    fn test_env_overrides_files_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[service]
port = 9100

[pagination]
default_limit = 15
"#,
            )?;
            jail.set_env("USERS_PAGINATION__DEFAULT_LIMIT", "25");
            jail.set_env("USERS_HTTP__COLLAPSE_ERROR_STATUS", "true");

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.service.port, 9100);
            assert_eq!(config.pagination.default_limit, 25);
            assert!(config.http.collapse_error_status);
            assert_eq!(config.pagination.default_page, 1);
            Ok(())
        });
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.store.operation_timeout(), Duration::from_secs(15));
        assert_eq!(config.store.connect_timeout(), Duration::from_secs(10));
    }
}
