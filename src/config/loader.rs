//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_BIND_ADDRESS: &str = "ORDER_SERVICE_BIND_ADDRESS";
pub const ENV_DATABASE_URL: &str = "ORDER_SERVICE_DATABASE_URL";
pub const ENV_REDIS_URL: &str = "ORDER_SERVICE_REDIS_URL";
pub const ENV_KAFKA_BROKERS: &str = "ORDER_SERVICE_KAFKA_BROKERS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ServiceConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config, |key| std::env::var(key).ok())
}

/// Defaults plus environment overrides, for running without a file.
pub fn load_from_env() -> Result<ServiceConfig, ConfigError> {
    finish(ServiceConfig::default(), |key| std::env::var(key).ok())
}

fn finish(
    mut config: ServiceConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ServiceConfig, ConfigError> {
    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overwrite connection settings from variables, when set and non-empty.
pub fn apply_env_overrides(config: &mut ServiceConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(addr) = get(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(url) = get(ENV_DATABASE_URL) {
        config.store.database_url = Some(url);
    }
    if let Some(url) = get(ENV_REDIS_URL) {
        config.cache.redis_url = Some(url);
    }
    if let Some(brokers) = get(ENV_KAFKA_BROKERS) {
        config.events.brokers = Some(brokers);
    }
}
