//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject a metadata header that collides with the client IP header
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GeoConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::GeoConfig;
use crate::http::request::CF_CONNECTING_IP;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("metadata.header `{0}` is not a valid header name")]
    InvalidHeaderName(String),

    #[error("metadata.header `{0}` is reserved for the client IP")]
    ReservedHeaderName(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GeoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let header = &config.metadata.header;
    match HeaderName::from_bytes(header.as_bytes()) {
        Ok(name) if name == CF_CONNECTING_IP => {
            errors.push(ValidationError::ReservedHeaderName(header.clone()));
        }
        Ok(_) => {}
        Err(_) => errors.push(ValidationError::InvalidHeaderName(header.clone())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
