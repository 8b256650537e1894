use crate::settings::{ProviderSettings, error::SettingsError};
use tracing::warn;

/// Above this many keys a single IN list gets unwieldy for most drivers.
const LARGE_BATCH_SIZE: usize = 1_000;
const LARGE_BATCH_WINDOW_MS: u64 = 100;

/// Checks provider settings before they are used.
pub struct SettingsValidator;

impl SettingsValidator {
    pub fn validate(settings: &ProviderSettings) -> Result<(), SettingsError> {
        let mut errors: Vec<String> = Vec::new();

        if settings.max_relation_depth == 0 {
            errors.push("max_relation_depth must be at least 1".to_string());
        }
        if settings.default_page_size == 0 {
            errors.push("default_page_size must be at least 1".to_string());
        }

        Self::validate_loader(settings, &mut errors);

        if !errors.is_empty() {
            return Err(SettingsError::ValidationFailed(errors));
        }
        Ok(())
    }

    fn validate_loader(settings: &ProviderSettings, errors: &mut Vec<String>) {
        let loader = &settings.loader;
        if loader.max_batch_size == 0 {
            errors.push("loader.max_batch_size must be at least 1".to_string());
        } else if loader.max_batch_size > LARGE_BATCH_SIZE {
            warn!(
                "Loader batch size {} is very large, IN lists may exceed driver limits",
                loader.max_batch_size
            );
        }

        if loader.batch_window_ms > LARGE_BATCH_WINDOW_MS {
            warn!(
                "Loader batch window of {}ms will delay every relation load",
                loader.batch_window_ms
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SettingsValidator::validate(&ProviderSettings::default()).is_ok());
    }

    #[test]
    fn test_zero_values_are_collected() {
        let mut settings = ProviderSettings::default();
        settings.max_relation_depth = 0;
        settings.loader.max_batch_size = 0;

        let Err(SettingsError::ValidationFailed(errors)) = SettingsValidator::validate(&settings)
        else {
            panic!("expected validation to fail");
        };
        assert_eq!(errors.len(), 2);
    }

    #[traced_test]
    #[test]
    fn test_large_batches_only_warn() {
        let mut settings = ProviderSettings::default();
        settings.loader.max_batch_size = 5_000;

        assert!(SettingsValidator::validate(&settings).is_ok());
        assert!(logs_contain("very large"));
    }
}
