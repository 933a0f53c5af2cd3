//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate bind addresses and timeouts
//! - Reject routes the mux would refuse (empty pattern, missing handler,
//!   duplicate pattern) and handler definitions that cannot be built
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MuxConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{uri::Authority, HeaderValue, StatusCode};
use thiserror::Error;

use crate::config::schema::{HandlerConfig, MuxConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("routes[{index}]: pattern must not be empty")]
    EmptyPattern { index: usize },

    #[error("routes[{index}]: duplicate pattern {pattern:?}")]
    DuplicatePattern { index: usize, pattern: String },

    #[error("routes[{index}] ({pattern}): missing handler")]
    MissingHandler { index: usize, pattern: String },

    #[error("routes[{index}] ({pattern}): {reason}")]
    InvalidHandler {
        index: usize,
        pattern: String,
        reason: String,
    },

    #[error("observability.log_format must be \"pretty\" or \"json\", got {0:?}")]
    InvalidLogFormat(String),
}

/// Validate `config`, collecting every problem found.
pub fn validate_config(config: &MuxConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::InvalidLogFormat(other.to_string())),
    }

    let mut seen = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        let pattern = route.pattern.clone();
        if pattern.is_empty() {
            errors.push(ValidationError::EmptyPattern { index });
        } else if !seen.insert(route.pattern.as_str()) {
            errors.push(ValidationError::DuplicatePattern {
                index,
                pattern: pattern.clone(),
            });
        }

        match &route.handler {
            None => errors.push(ValidationError::MissingHandler { index, pattern }),
            Some(handler) => {
                if let Err(reason) = check_handler(handler) {
                    errors.push(ValidationError::InvalidHandler { index, pattern, reason });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_handler(handler: &HandlerConfig) -> Result<(), String> {
    match handler {
        HandlerConfig::Static {
            status, content_type, ..
        } => {
            StatusCode::from_u16(*status).map_err(|_| format!("invalid status code {}", status))?;
            HeaderValue::from_str(content_type).map_err(|_| format!("invalid content type {:?}", content_type))?;
        }
        HandlerConfig::Redirect { location, .. } => {
            HeaderValue::from_str(location).map_err(|_| format!("invalid redirect location {:?}", location))?;
        }
        HandlerConfig::Proxy { upstream } => {
            upstream
                .parse::<Authority>()
                .map_err(|e| format!("invalid upstream {:?}: {}", upstream, e))?;
        }
    }
    Ok(())
}
