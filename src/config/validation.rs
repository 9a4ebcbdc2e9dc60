//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, address parses)
//! - Check that the storage directory exists
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// Smallest read bound that still fits a request line.
const MIN_REQUEST_BYTES: usize = 16;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("listener.capacity must be greater than zero when set")]
    ZeroCapacity,

    #[error("limits.max_request_bytes must be at least 16, got {0}")]
    RequestLimitTooSmall(usize),

    #[error("timeouts.read_secs must be greater than zero")]
    ZeroReadTimeout,

    #[error("storage.directory {0:?} is not an existing directory")]
    StorageDirectory(PathBuf),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }
    if config.listener.capacity == Some(0) {
        errors.push(ValidationError::ZeroCapacity);
    }
    if config.limits.max_request_bytes < MIN_REQUEST_BYTES {
        errors.push(ValidationError::RequestLimitTooSmall(config.limits.max_request_bytes));
    }
    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::ZeroReadTimeout);
    }
    if let Some(dir) = &config.storage.directory {
        if !dir.is_dir() {
            errors.push(ValidationError::StorageDirectory(dir.clone()));
        }
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
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

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.listener.max_connections = 0;
        config.listener.capacity = Some(0);
        config.timeouts.read_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::ZeroMaxConnections,
                ValidationError::ZeroCapacity,
                ValidationError::ZeroReadTimeout,
            ]
        );
    }

    #[test]
    fn missing_storage_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let mut config = ServerConfig::default();
        config.storage.directory = Some(missing.clone());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::StorageDirectory(missing)])
        );

        config.storage.directory = Some(dir.path().to_path_buf());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn tiny_request_limit_is_rejected() {
        let mut config = ServerConfig::default();
        config.limits.max_request_bytes = 4;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RequestLimitTooSmall(4)])
        );
    }
}
