//! Application configuration management.
//!
//! Sources are layered: `config/default.toml`, then `config/{RUN_MODE}.toml`,
//! then `ENVELOPE__*` environment variables. Every field has a default, so an
//! empty environment yields a runnable in-memory setup.

use serde::Deserialize;

/// Prefix for environment overrides, e.g. `ENVELOPE__DATABASE__URL`.
pub const ENV_PREFIX: &str = "ENVELOPE";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Ledger retry configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory with static frontend assets, served as a fallback.
    #[serde(default)]
    pub frontend_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_dir: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (`postgres://...` or `sqlite:...`).
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl DatabaseConfig {
    /// Returns true when the URL points at a private in-memory SQLite database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("sqlite::memory:") || self.url.contains("mode=memory")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Retry discipline for ledger reads and writes.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Upper bound on attempts per operation.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,
    /// Cap on the doubling backoff, in milliseconds.
    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_backoff_ms: default_retry_initial_backoff_ms(),
            retry_max_backoff_ms: default_retry_max_backoff_ms(),
        }
    }
}

fn default_retry_max_attempts() -> u32 {
    5
}

fn default_retry_initial_backoff_ms() -> u64 {
    100
}

fn default_retry_max_backoff_ms() -> u64 {
    2000
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Returns the `host:port` pair to bind the HTTP listener to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults_from_empty_environment() {
        temp_env::with_vars_unset(
            [
                "ENVELOPE__SERVER__PORT",
                "ENVELOPE__DATABASE__URL",
                "ENVELOPE__LEDGER__RETRY_MAX_ATTEMPTS",
                "ENVELOPE__LOGGING__JSON",
                "RUN_MODE",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.server.port, 3000);
                assert!(config.server.frontend_dir.is_none());
                assert_eq!(config.database.url, "sqlite::memory:");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.database.min_connections, 1);
                assert_eq!(config.ledger.retry_max_attempts, 5);
                assert_eq!(config.ledger.retry_initial_backoff_ms, 100);
                assert_eq!(config.ledger.retry_max_backoff_ms, 2000);
                assert_eq!(config.logging.level, "info");
                assert!(!config.logging.json);
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                ("ENVELOPE__SERVER__PORT", Some("8081")),
                ("ENVELOPE__DATABASE__URL", Some("sqlite://ledger.db?mode=rwc")),
                ("ENVELOPE__LEDGER__RETRY_MAX_ATTEMPTS", Some("3")),
                ("ENVELOPE__LOGGING__JSON", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.server.port, 8081);
                assert_eq!(config.database.url, "sqlite://ledger.db?mode=rwc");
                assert_eq!(config.ledger.retry_max_attempts, 3);
                assert_eq!(config.ledger.retry_initial_backoff_ms, 100);
                assert!(config.logging.json);
            },
        );
    }

    #[test]
    fn test_bind_address() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 4000;
        assert_eq!(config.bind_address(), "127.0.0.1:4000");
    }

    #[test]
    fn test_in_memory_detection() {
        let mut db = DatabaseConfig::default();
        assert!(db.is_in_memory());

        db.url = "sqlite:file:ledger?mode=memory&cache=shared".to_string();
        assert!(db.is_in_memory());

        db.url = "postgres://localhost/envelope".to_string();
        assert!(!db.is_in_memory());
    }
}
