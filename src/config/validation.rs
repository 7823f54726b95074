//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("nick is required")]
    MissingNick,
    #[error("nick must not contain whitespace, got '{0}'")]
    InvalidNick(String),
    #[error("command_prefix is required")]
    MissingCommandPrefix,
    #[error("port must be non-zero")]
    InvalidPort,
    #[error("channel name must not contain whitespace or commas, got '{0}'")]
    InvalidChannel(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if config.nick.contains(char::is_whitespace) {
        errors.push(ValidationError::InvalidNick(config.nick.clone()));
    }

    if config.command_prefix.is_empty() {
        errors.push(ValidationError::MissingCommandPrefix);
    }

    if config.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    for channel in &config.channels {
        if channel.name.contains(|c: char| c.is_whitespace() || c == ',') {
            errors.push(ValidationError::InvalidChannel(channel.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
