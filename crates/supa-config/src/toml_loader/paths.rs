//! Where the config file lives, and writing the default one.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use supa_common::ConfigError;
use tracing::info;

use super::template::default_config_toml;

const APP_DIR: &str = "supa-realtime";
const FILE_NAME: &str = "config.toml";

/// `<os config dir>/supa-realtime/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| config_path_in(&dir))
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))
}

pub(crate) fn config_path_in(config_dir: &Path) -> PathBuf {
    config_dir.join(APP_DIR).join(FILE_NAME)
}

/// Write the documented default config to `path`, creating parent
/// directories. An existing file is never overwritten.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    let write_error = |e: std::io::Error| {
        ConfigError::ParseError(format!("failed to write {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_error)?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(write_error)?;
    file.write_all(default_config_toml().as_bytes())
        .map_err(write_error)?;

    info!(path = %path.display(), "Created default config");
    Ok(())
}
