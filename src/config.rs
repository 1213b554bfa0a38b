use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ORDER_TIMEOUT_SECS: u64 = 15;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Bearer tokens granting the regular read/write API permissions,
    /// comma-separated
    #[serde(default)]
    pub api_keys: Option<String>,

    /// Bearer tokens additionally granting the integration (admin)
    /// permission, comma-separated
    #[serde(default)]
    pub admin_api_keys: Option<String>,

    /// Base URL of the 1C HTTP exchange service
    pub onec_base_url: String,

    /// Basic-auth credentials for the 1C service
    pub onec_username: String,
    pub onec_password: String,

    /// Timeout for the catalog download call (seconds)
    #[serde(default = "default_catalog_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub onec_catalog_timeout_secs: u64,

    /// Timeout for the order creation call (seconds); larger than the
    /// catalog timeout because order acceptance does heavier remote-side work
    #[serde(default = "default_order_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub onec_order_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_catalog_timeout_secs() -> u64 {
    DEFAULT_CATALOG_TIMEOUT_SECS
}

fn default_order_timeout_secs() -> u64 {
    DEFAULT_ORDER_TIMEOUT_SECS
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Tokens accepted for the regular API role.
    pub fn api_key_list(&self) -> Vec<String> {
        split_keys(self.api_keys.as_deref())
    }

    /// Tokens accepted for the admin role (integration endpoints).
    pub fn admin_api_key_list(&self) -> Vec<String> {
        split_keys(self.admin_api_keys.as_deref())
    }
}

fn split_keys(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration load error: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/default`, the environment-specific file,
/// and `APP__`-prefixed environment variables, in that order of precedence.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://onec_bridge.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("onec_base_url", "http://localhost:8001/1c_mock/hs/exchange")?
        .set_default("onec_username", "user1c")?
        .set_default("onec_password", "password1c")?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}

/// Initializes the global tracing subscriber from configuration.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("onec_bridge={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}
