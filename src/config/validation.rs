//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AdapterConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::{AdapterConfig, Mode};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &AdapterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.mode == Mode::Direct {
        if let Err(e) = config.direct.target() {
            errors.push(ValidationError::new(
                "direct.target_address",
                format!("{:?} is not a socket address: {}", config.direct.target_address, e),
            ));
        }
    }

    for (i, media_type) in config.binary_media_types.iter().enumerate() {
        if !media_type.contains('/') {
            errors.push(ValidationError::new(
                format!("binary_media_types[{}]", i),
                format!("{:?} is not a type/subtype media type", media_type),
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("{:?} is not one of {}", config.observability.log_level, LOG_LEVELS.join(", ")),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
