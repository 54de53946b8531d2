//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

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
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    let config: RouterConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            driver = "mysql"
            sources = "app:pw@db0/app;app:pw@db1/app"

            [pool]
            max_connections = 4
            max_open_connections = 2
            acquire_timeout_secs = 5
            connect_eagerly = true

            [observability]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.driver, "mysql");
        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.pool.max_open_connections, 2);
        assert!(config.pool.connect_eagerly);
        assert_eq!(config.observability.log_level, "debug");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("driver = \"sqlite\"\nsources = \":memory:\"").unwrap();
        assert_eq!(config.pool.max_connections, 10);
        assert_eq!(config.pool.max_open_connections, 0);
        assert_eq!(config.pool.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_config("driver = "), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation_error() {
        let err = parse_config("driver = \"postgres\"\nsources = \"\"").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: sources: no sources");
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/replica-router.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
