//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{RagError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering a query needs the provider API key.
    Ask,
    /// Serving needs the provider API key.
    Serve,
    /// Clearing the cache has no requirements.
    ClearCache,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask | Operation::Serve => check_api_key(&settings.provider.api_key_env),
        Operation::ClearCache => Ok(()),
    }
}

/// Check that the provider API key variable is set and non-empty.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(RagError::Config(format!(
            "{var} is empty. Set it with: export {var}='...'"
        ))),
        Err(_) => Err(RagError::Config(format!(
            "{var} not set. Set it with: export {var}='...'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn settings_with_key_var(var: &str) -> Settings {
        let mut settings = Settings::default();
        settings.provider.api_key_env = var.to_string();
        settings
    }

    #[test]
    fn test_clear_cache_has_no_requirements() {
        let settings = settings_with_key_var("YTRAG_TEST_PREFLIGHT_UNSET");
        assert_ok!(check(Operation::ClearCache, &settings));
    }

    #[test]
    fn test_missing_key_fails_ask_and_serve() {
        let settings = settings_with_key_var("YTRAG_TEST_PREFLIGHT_UNSET");

        let err = assert_err!(check(Operation::Ask, &settings));
        assert!(err.to_string().contains("YTRAG_TEST_PREFLIGHT_UNSET not set"));
        assert_err!(check(Operation::Serve, &settings));
    }

    #[test]
    fn test_present_key_passes() {
        // PATH is set in any test environment.
        let settings = settings_with_key_var("PATH");
        assert_ok!(check(Operation::Ask, &settings));
    }
}
