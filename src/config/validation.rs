//! Configuration validation.
//!
//! # Responsibilities
//! - Run the validation engine over every section
//! - Check values serde cannot (socket addresses)
//!
//! # Design Decisions
//! - Returns all section errors, not just the first
//! - Pure function: BoxConfig → Result<(), Vec<SectionError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::BoxConfig;
use crate::validate::{Validate, Validator};

/// A section that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{section}] {message}")]
pub struct SectionError {
    pub section: &'static str,
    pub message: String,
}

/// Validate the whole configuration with one validator.
pub fn validate_config(config: &BoxConfig, validator: &Validator) -> Result<(), Vec<SectionError>> {
    let mut errors = Vec::new();
    let mut check = |section: &'static str, payload: &dyn Validate| {
        if let Err(err) = validator.validate(payload) {
            errors.extend(err.messages.into_iter().map(|message| SectionError { section, message }));
        }
    };
    check("backends", &config.backends);
    check("validation", &config.validation);
    check("logger", &config.logger);
    check("cache", &config.cache);
    check("request", &config.request);
    check("server", &config.server);
    check("instrument", &config.instrument);
    check("observability", &config.observability);
    if let Some(binding) = &config.binding {
        check("binding", binding);
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(SectionError {
            section: "observability",
            message: format!("metrics address {:?} is not a socket address", observability.metrics_address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
