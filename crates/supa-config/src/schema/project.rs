//! Project identity: which backend to talk to and with which key.

use serde::{Deserialize, Serialize};

/// Backend project configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Host of the backend, without scheme (e.g. "abcdefgh.supabase.co").
    pub host: String,
    /// Publishable API key, sent as the `apikey` query parameter.
    pub api_key: String,
}

impl std::fmt::Debug for ProjectConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectConfig")
            .field("host", &self.host)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
