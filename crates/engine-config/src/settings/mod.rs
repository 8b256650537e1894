use crate::settings::{error::SettingsError, validator::SettingsValidator};
use model::core::data_type::SqlDialect;
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr, time::Duration};
use tracing::info;

pub mod error;
pub mod validator;

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "REFINE_SQL_";

pub const DEFAULT_MAX_RELATION_DEPTH: usize = 3;
pub const DEFAULT_BATCH_WINDOW_MS: u64 = 2;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Runtime configuration of a data provider.
///
/// ```toml
/// dialect = "sqlite"
/// max_relation_depth = 3
/// default_page_size = 10
/// strict_schema = false
///
/// [loader]
/// batch_window_ms = 2
/// max_batch_size = 100
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// SQL flavour to compile for.
    pub dialect: SqlDialect,
    /// Deepest nested relation path (`comments.author.profile` is 3).
    pub max_relation_depth: usize,
    /// Page size used when a list request omits one.
    pub default_page_size: u64,
    /// Promote schema warnings to errors.
    pub strict_schema: bool,
    pub loader: LoaderSettings,
}

/// Data-loader batching knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// How long a batch stays open for more keys.
    pub batch_window_ms: u64,
    /// Flush as soon as this many keys are pending.
    pub max_batch_size: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::Sqlite,
            max_relation_depth: DEFAULT_MAX_RELATION_DEPTH,
            default_page_size: DEFAULT_PAGE_SIZE,
            strict_schema: false,
            loader: LoaderSettings::default(),
        }
    }
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            batch_window_ms: DEFAULT_BATCH_WINDOW_MS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl LoaderSettings {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }
}

impl ProviderSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Reads the optional file, applies `REFINE_SQL_*` overrides from the
    /// process environment and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        SettingsValidator::validate(&settings)?;

        info!(
            dialect = %settings.dialect,
            max_relation_depth = settings.max_relation_depth,
            batch_window_ms = settings.loader.batch_window_ms,
            max_batch_size = settings.loader.max_batch_size,
            "Provider settings loaded"
        );
        Ok(settings)
    }

    /// Applies overrides looked up by full variable name, e.g.
    /// `REFINE_SQL_MAX_BATCH_SIZE`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dialect) = read_override(&lookup, "DIALECT")? {
            self.dialect = dialect;
        }
        if let Some(depth) = read_override(&lookup, "MAX_RELATION_DEPTH")? {
            self.max_relation_depth = depth;
        }
        if let Some(size) = read_override(&lookup, "DEFAULT_PAGE_SIZE")? {
            self.default_page_size = size;
        }
        if let Some(strict) = read_override(&lookup, "STRICT_SCHEMA")? {
            self.strict_schema = strict;
        }
        if let Some(window) = read_override(&lookup, "BATCH_WINDOW_MS")? {
            self.loader.batch_window_ms = window;
        }
        if let Some(size) = read_override(&lookup, "MAX_BATCH_SIZE")? {
            self.loader.max_batch_size = size;
        }
        Ok(())
    }
}

fn read_override<T, F>(lookup: &F, name: &str) -> Result<Option<T>, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let key = format!("{ENV_PREFIX}{name}");
    match lookup(&key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| SettingsError::InvalidOverride {
                key,
                value: raw.clone(),
                reason: err.to_string(),
            }),
    }
}
