//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the realtime client expects.

mod logging;
mod project;
mod realtime;

pub use logging::*;
pub use project::*;
pub use realtime::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupaConfig {
    pub project: ProjectConfig,
    pub realtime: RealtimeSettings,
    pub logging: LoggingConfig,
}
