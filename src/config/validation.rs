//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the driver is supported and at least one source is given
//! - Validate value ranges (pool size > 0, timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::RouterConfig;
use crate::router::sources::{split_sources, Driver};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.driver.trim().is_empty() {
        errors.push(ValidationError::new("driver", "must be set"));
    } else if let Err(e) = Driver::parse(&config.driver) {
        errors.push(ValidationError::new("driver", e.to_string()));
    }

    if let Err(e) = split_sources(&config.sources) {
        errors.push(ValidationError::new("sources", e.to_string()));
    }

    if config.pool.max_connections == 0 {
        errors.push(ValidationError::new("pool.max_connections", "must be greater than 0"));
    }
    if config.pool.acquire_timeout_secs == 0 {
        errors.push(ValidationError::new("pool.acquire_timeout_secs", "must be greater than 0"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
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

    fn valid() -> RouterConfig {
        RouterConfig {
            driver: "postgres".into(),
            sources: "db0/app;db1/app".into(),
            ..RouterConfig::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_default_config_is_incomplete() {
        let errors = validate_config(&RouterConfig::default()).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["driver", "sources"]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.driver = "oracle".into();
        config.sources = " ; ".into();
        config.pool.max_connections = 0;
        config.pool.acquire_timeout_secs = 0;
        config.observability.log_level = "loud".into();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 6);
        assert_eq!(errors[0].to_string(), "driver: unsupported driver: oracle");
        assert_eq!(errors[1].to_string(), "sources: no sources");
    }
}
