//! Mandatory-option checks run before the backend is derived.

use crate::config_file::{ConfigInput, MANDATORY_CONFIG};
use crate::error::{BackendError, Result};

/// Capability for checking that required options are present.
///
/// The lifecycle layer calls this before deriving the backend so a
/// half-configured unit is reported as Blocked instead of failing.
pub trait Validator {
    /// Returns the required keys that are absent or blank, in the order given.
    fn missing(&self, config: &ConfigInput, required: &[&str]) -> Vec<String>;

    /// Fails with [`BackendError::Validation`] when any key is missing.
    fn check_mandatory(&self, config: &ConfigInput, required: &[&str]) -> Result<()> {
        let missing = self.missing(config, required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BackendError::validation(missing))
        }
    }
}

/// Treats absent keys and blank strings as missing
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceValidator;

impl Validator for PresenceValidator {
    fn missing(&self, config: &ConfigInput, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|key| config.get_non_blank(key).is_none())
            .map(|key| (*key).to_string())
            .collect()
    }
}

/// Checks the plugin's mandatory options with the default validator
pub fn check_mandatory(config: &ConfigInput) -> Result<()> {
    PresenceValidator.check_mandatory(config, MANDATORY_CONFIG)
}
