//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//! - Detect conflicting static mounts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Directory existence is checked when mounts are bound, not here

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} `{value}`: not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("static mount prefix `{0}` must start with '/'")]
    RelativeMountPrefix(String),

    #[error("static mount prefix `{0}` is declared more than once")]
    DuplicateMountPrefix(String),
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("limits.max_body_bytes"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    let mut prefixes = HashSet::new();
    for mount in &config.static_mounts {
        if !mount.prefix.starts_with('/') {
            errors.push(ValidationError::RelativeMountPrefix(mount.prefix.clone()));
        }
        if !prefixes.insert(mount.prefix.trim_end_matches('/')) {
            errors.push(ValidationError::DuplicateMountPrefix(mount.prefix.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
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
    use crate::config::schema::StaticMountConfig;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.limits.max_body_bytes = 0;
        config.timeouts.request_secs = 0;
        config.static_mounts = vec![
            StaticMountConfig {
                prefix: "public".into(),
                directory: "./public".into(),
            },
            StaticMountConfig {
                prefix: "/assets".into(),
                directory: "./a".into(),
            },
            StaticMountConfig {
                prefix: "/assets/".into(),
                directory: "./b".into(),
            },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::Zero("timeouts.request_secs")));
        assert!(errors.contains(&ValidationError::RelativeMountPrefix("public".into())));
        assert!(errors.contains(&ValidationError::DuplicateMountPrefix("/assets/".into())));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
