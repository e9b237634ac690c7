use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_STORAGE_BACKEND: &str = "file";
const DEFAULT_STORAGE_DIR: &str = "data";
const DEFAULT_LOGIN_DELAY_MS: u64 = 500;
const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 50;

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Deployment environment (development, test, production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Default tracing level; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// "memory" or "file"
    #[serde(default = "default_storage_backend")]
    #[validate(custom = "validate_storage_backend")]
    pub storage_backend: String,

    /// Directory holding one JSON file per collection
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Namespace prepended to every storage key
    #[serde(default = "default_key_prefix")]
    #[validate(length(min = 1, max = 32, message = "key_prefix must be 1-32 characters"))]
    pub key_prefix: String,

    /// Write the default dataset for missing collections on startup
    #[serde(default = "default_true")]
    pub seed_on_start: bool,

    /// Artificial delay before a login attempt is answered
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,

    /// Total stock below which a product counts as low on stock
    #[serde(default = "default_low_stock_threshold")]
    #[validate(range(min = 1))]
    pub low_stock_threshold: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            storage_backend: default_storage_backend(),
            storage_dir: default_storage_dir(),
            key_prefix: default_key_prefix(),
            seed_on_start: true,
            login_delay_ms: DEFAULT_LOGIN_DELAY_MS,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl AppConfig {
    pub fn uses_file_storage(&self) -> bool {
        self.storage_backend.eq_ignore_ascii_case("file")
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_storage_backend() -> String {
    DEFAULT_STORAGE_BACKEND.to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_DIR)
}

fn default_key_prefix() -> String {
    crate::storage::DEFAULT_KEY_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_login_delay_ms() -> u64 {
    DEFAULT_LOGIN_DELAY_MS
}

fn default_low_stock_threshold() -> u64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_storage_backend(backend: &str) -> Result<(), ValidationError> {
    match backend.to_lowercase().as_str() {
        "memory" | "file" => Ok(()),
        _ => {
            let mut err = ValidationError::new("storage_backend");
            err.message = Some("Must be one of: memory, file".into());
            Err(err)
        }
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("agri_erp={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("storage_backend", DEFAULT_STORAGE_BACKEND)?
        .set_default("storage_dir", DEFAULT_STORAGE_DIR)?
        .set_default("key_prefix", crate::storage::DEFAULT_KEY_PREFIX)?
        .set_default("seed_on_start", true)?
        .set_default("login_delay_ms", DEFAULT_LOGIN_DELAY_MS as i64)?
        .set_default("low_stock_threshold", DEFAULT_LOW_STOCK_THRESHOLD as i64)?
        .add_source(File::with_name(&config_dir.join("default").to_string_lossy()).required(false))
        .add_source(File::with_name(&config_dir.join(&run_env).to_string_lossy()).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.key_prefix, "ag_");
        assert_eq!(cfg.login_delay_ms, 500);
        assert_eq!(cfg.low_stock_threshold, 50);
        assert!(cfg.uses_file_storage());
    }

    #[test]
    fn rejects_unknown_backend_and_level() {
        let cfg = AppConfig {
            storage_backend: "redis".into(),
            log_level: "loud".into(),
            ..AppConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("storage_backend"));
        assert!(fields.contains_key("log_level"));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("default.toml")).unwrap();
        writeln!(
            file,
            "storage_backend = \"memory\"\nlow_stock_threshold = 25\nlogin_delay_ms = 0"
        )
        .unwrap();

        let cfg = load_config_from(dir.path()).unwrap();
        assert_eq!(cfg.storage_backend, "memory");
        assert_eq!(cfg.low_stock_threshold, 25);
        assert_eq!(cfg.login_delay_ms, 0);
        assert_eq!(cfg.key_prefix, "ag_");
    }
}
