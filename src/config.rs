use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DATABASE_URL: &str = "sqlite://bloomtrack.db?mode=rwc";
const CONFIG_DIR: &str = "config";

/// Runtime configuration for an embedding application.
///
/// Values are layered: defaults, then an optional `config/default.toml`,
/// then `BLOOMTRACK__`-prefixed environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    #[validate(length(min = 1))]
    pub database_url: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Run pending migrations on startup.
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_auto_migrate() -> bool {
    true
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_db_min_connections() -> u32 {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            log_level: default_log_level(),
            auto_migrate: default_auto_migrate(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
        }
    }
}

impl AppConfig {
    /// Convenience constructor for tests and simple embedders.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from `config/default.toml` (if present) and the
    /// environment, then validates it.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let default_file = Path::new(CONFIG_DIR).join("default.toml");
        if default_file.exists() {
            builder = builder.add_source(File::from(default_file));
        }

        let config = builder
            .add_source(Environment::with_prefix("BLOOMTRACK").separator("__"))
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid configuration: {}", e)))?;

        info!(database_url = %app_config.database_url, "configuration loaded");
        Ok(app_config)
    }
}
