use crate::{report::ValidationReport, settings::error::SettingsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Schema validation failed with {} error(s): {}", .0.errors.len(), .0.summary())]
    SchemaValidation(ValidationReport),

    #[error("Invalid settings: {0}")]
    Settings(#[from] SettingsError),
}
