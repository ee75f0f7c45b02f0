//! Configuration for the realtime client.
//!
//! Provides TOML-based configuration with full validation. All sections use
//! sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use supa_config::{load_config, config_to_json, validation};
//!
//! let mut config = load_config().expect("failed to load config");
//! if config.project.host.is_empty() {
//!     config.project.host = "abc.supabase.co".into();
//!     config.project.api_key = "anon-key".into();
//! }
//! validation::validate(&config).expect("incomplete config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    LoggingConfig, ProjectConfig, RealtimeSettings, SupaConfig, WebSocketSettings,
    CONFIG_SCHEMA_VERSION,
};
pub use toml_loader::{default_config_path, load_from_path};

use supa_common::ConfigError;

/// Convenience function to load config from the platform default path.
///
/// Loads `config.toml` from the OS config directory, creates a default
/// if none exists, and validates every setting except the project
/// identity. A freshly created file has no `host` or `api_key`; run
/// [`validation::validate`] once those are filled in.
pub fn load_config() -> Result<SupaConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate_settings(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
///
/// The API key is masked so the output is safe to print.
pub fn config_to_json(config: &SupaConfig) -> String {
    let mut redacted = config.clone();
    if !redacted.project.api_key.is_empty() {
        redacted.project.api_key = "[REDACTED]".into();
    }
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
