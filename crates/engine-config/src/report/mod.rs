use crate::{error::ConfigError, report::finding::Finding};
use serde::Serialize;

pub mod finding;

/// Outcome of validating a schema.
///
/// `valid` is false as soon as there is one error; warnings never block.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            findings.into_iter().partition(Finding::is_error);
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Moves every warning into the error list.
    pub fn promote_warnings(mut self) -> Self {
        for mut warning in self.warnings.drain(..) {
            warning.severity = finding::Severity::Error;
            self.errors.push(warning);
        }
        self.valid = self.errors.is_empty();
        self
    }

    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_result(self) -> Result<Self, ConfigError> {
        if self.valid {
            Ok(self)
        } else {
            Err(ConfigError::SchemaValidation(self))
        }
    }
}
