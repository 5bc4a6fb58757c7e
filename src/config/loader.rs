//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {key}={value:?}: {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    load_from_sources(path, |key| std::env::var(key).ok())
}

/// Like [`load_config`], with an injectable environment lookup.
pub fn load_from_sources<F>(path: Option<&Path>, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment variables on top of `config`.
///
/// Unset and blank variables leave the current value in place.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvSource { lookup };

    env.parse_into("PORT", &mut config.port)?;
    env.duration_into("STARTUP_DELAY", &mut config.startup_delay)?;
    env.parse_into("SERVICE_NAME", &mut config.service_name)?;
    env.parse_into("VERSION", &mut config.version)?;
    env.duration_into("SHUTDOWN_WAIT", &mut config.shutdown_wait)?;
    env.duration_into("READ_TIMEOUT", &mut config.read_timeout)?;
    env.duration_into("WRITE_TIMEOUT", &mut config.write_timeout)?;
    env.duration_into("IDLE_TIMEOUT", &mut config.idle_timeout)?;
    env.parse_into("MAX_BODY_BYTES", &mut config.max_body_bytes)?;

    let observability = &mut config.observability;
    env.parse_into("LOG_LEVEL", &mut observability.log_level)?;
    env.parse_into("LOG_FORMAT", &mut observability.log_format)?;
    env.parse_into("METRICS_ENABLED", &mut observability.metrics_enabled)?;
    env.parse_into("METRICS_ADDRESS", &mut observability.metrics_address)?;

    Ok(())
}

struct EnvSource<F> {
    lookup: F,
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_into<T>(&self, key: &'static str, target: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        self.set_with(key, target, |v| v.parse::<T>().map_err(|e| e.to_string()))
    }

    fn duration_into(&self, key: &'static str, target: &mut Duration) -> Result<(), ConfigError> {
        self.set_with(key, target, |v| {
            humantime::parse_duration(v).map_err(|e| e.to_string())
        })
    }

    fn set_with<T>(
        &self,
        key: &'static str,
        target: &mut T,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<(), ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(());
        };
        *target = parse(&value).map_err(|reason| ConfigError::Env {
            key,
            value,
            reason,
        })?;
        Ok(())
    }
}
