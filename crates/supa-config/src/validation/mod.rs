//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::SupaConfig;
use supa_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &SupaConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_project(&mut errors, config);
    sections::validate_realtime(&mut errors, config);
    sections::validate_logging(&mut errors, config);

    collect(errors)
}

/// Validate everything except the project identity (`host`, `api_key`),
/// which callers often supply after loading.
pub fn validate_settings(config: &SupaConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_realtime(&mut errors, config);
    sections::validate_logging(&mut errors, config);

    collect(errors)
}

fn collect(errors: Vec<String>) -> Result<(), ConfigError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
