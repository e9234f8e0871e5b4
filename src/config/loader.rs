//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::BoxConfig;
use crate::config::validation::{validate_config, SectionError};
use crate::outcome::{BoxError, Code};
use crate::validate::Validator;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<SectionError>),
}

fn join_errors(errors: &[SectionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ConfigError> for BoxError {
    fn from(err: ConfigError) -> Self {
        let code = match &err {
            ConfigError::Io(_) => Code::RUNTIME_PARAM_ERROR,
            ConfigError::Parse(_) | ConfigError::Json(_) => Code::CODEC_ERROR,
            ConfigError::Validation(_) => Code::PARAM_INVALID,
        };
        BoxError::new(code, err.to_string()).with_cause(err)
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<BoxConfig, ConfigError> {
    let config: BoxConfig = toml::from_str(content)?;
    validate_config(&config, &Validator::new(config.validation.locale)).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BoxConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
