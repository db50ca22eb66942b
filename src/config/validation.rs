//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check addresses parse and paths have the expected shape
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    BadAddress { field: &'static str, value: String },

    #[error("gateway.theme_path must start with '/': {0}")]
    ThemePath(String),

    #[error("gateway.default_document must look like host/path: {0}")]
    DefaultDocument(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.gemini.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "gemini.connect_timeout_secs" });
    }
    if config.gemini.read_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "gemini.read_timeout_secs" });
    }
    if config.gemini.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "gemini.max_body_bytes" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if !config.gateway.theme_path.starts_with('/') {
        errors.push(ValidationError::ThemePath(config.gateway.theme_path.clone()));
    }

    let document = &config.gateway.default_document;
    if document.is_empty() || document.starts_with('/') || document.contains("://") {
        errors.push(ValidationError::DefaultDocument(document.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
