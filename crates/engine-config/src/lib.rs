//! Provider configuration and schema validation.

pub mod error;
pub mod report;
pub mod settings;
pub mod validation;

pub use error::ConfigError;
pub use report::{ValidationReport, finding::Finding};
pub use settings::{ProviderSettings, validator::SettingsValidator};
pub use validation::schema_validator::SchemaValidator;
