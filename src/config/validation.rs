//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and env parsing handle syntax)
//! - Validate value ranges (port, startup delay, shutdown deadline)
//! - Check cross-field requirements (metrics address when metrics are on)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::schema::ServiceConfig;

/// Longest accepted `startup_delay`: two years, below the longest timer the
/// Tokio runtime can arm.
pub const MAX_STARTUP_DELAY: Duration = Duration::from_secs(2 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("port must be between 1 and 65535")]
    InvalidPort,

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("startup_delay must not exceed 730 days")]
    StartupDelayTooLarge,

    #[error("shutdown_wait must be greater than zero")]
    ZeroShutdownWait,

    #[error("metrics_address {address:?} is not a valid socket address")]
    InvalidMetricsAddress { address: String },
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if config.startup_delay > MAX_STARTUP_DELAY {
        errors.push(ValidationError::StartupDelayTooLarge);
    }
    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyField {
            field: "service_name",
        });
    }
    if config.version.trim().is_empty() {
        errors.push(ValidationError::EmptyField { field: "version" });
    }
    if config.shutdown_wait.is_zero() {
        errors.push(ValidationError::ZeroShutdownWait);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress {
            address: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServiceConfig::default()), Ok(()));
    }

    #[test]
    fn zero_startup_delay_is_allowed() {
        let config = ServiceConfig {
            startup_delay: Duration::ZERO,
            ..ServiceConfig::default()
        };
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn startup_delay_is_bounded() {
        let at_limit = ServiceConfig {
            startup_delay: MAX_STARTUP_DELAY,
            ..ServiceConfig::default()
        };
        assert_eq!(validate_config(&at_limit), Ok(()));

        let beyond = ServiceConfig {
            startup_delay: MAX_STARTUP_DELAY + Duration::from_secs(1),
            ..ServiceConfig::default()
        };
        assert_eq!(
            validate_config(&beyond),
            Err(vec![ValidationError::StartupDelayTooLarge])
        );
    }

    #[test]
    fn reports_every_problem() {
        let mut config = ServiceConfig {
            port: 0,
            service_name: "  ".to_string(),
            shutdown_wait: Duration::ZERO,
            ..ServiceConfig::default()
        };
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidPort,
                ValidationError::EmptyField {
                    field: "service_name"
                },
                ValidationError::ZeroShutdownWait,
                ValidationError::InvalidMetricsAddress {
                    address: "nowhere".to_string()
                },
            ]
        );
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
