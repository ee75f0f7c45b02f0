//! Reading config files.

use std::io::ErrorKind;
use std::path::Path;

use supa_common::ConfigError;
use tracing::{debug, info, warn};

use super::paths::{create_default_config, default_config_path};
use crate::schema::SupaConfig;
use crate::validation;

/// Parse TOML text; missing sections and fields take their defaults.
pub fn parse_config(content: &str) -> Result<SupaConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseError(format!("invalid TOML: {e}")))
}

/// Load config from a TOML file.
///
/// Invalid values are logged and the parsed config is still returned;
/// callers that need a valid config run [`validation::validate`] after
/// applying their own overrides.
pub fn load_from_path(path: &Path) -> Result<SupaConfig, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        Err(e) => {
            return Err(ConfigError::ParseError(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    let config = parse_config(&content)?;
    if let Err(e) = validation::validate(&config) {
        warn!(path = %path.display(), error = %e, "Config has invalid values");
    }
    debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load `config.toml` from the OS config directory, writing the documented
/// default file first if there is none.
pub fn load_default() -> Result<SupaConfig, ConfigError> {
    let path = default_config_path()?;
    match load_from_path(&path) {
        Err(ConfigError::FileNotFound(_)) => {
            info!(path = %path.display(), "No config file, writing defaults");
            create_default_config(&path)?;
            Ok(SupaConfig::default())
        }
        other => other,
    }
}
