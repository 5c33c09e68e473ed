use serde::Deserialize;

use crate::errors::SalaError;

/// Address of the room membership service used when none is configured.
const DEFAULT_SERVICE_URL: &str = "ws://localhost:3001";

/// In-memory session configuration.
///
/// Nothing here is persisted; shells construct a config per launch and
/// may override the service address with `SALA_SERVICE_URL`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SalaConfig {
    #[serde(default = "default_service_url")]
    pub service_url: String,
    #[serde(default = "default_true")]
    pub camera_enabled_on_join: bool,
    #[serde(default = "default_true")]
    pub microphone_enabled_on_join: bool,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SalaConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            camera_enabled_on_join: true,
            microphone_enabled_on_join: true,
        }
    }
}

impl SalaConfig {
    /// Build a config from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("SALA_SERVICE_URL") {
            if !url.trim().is_empty() {
                config.service_url = url.trim().to_string();
            }
        }
        config
    }

    /// Check that the service address is a ws:// or wss:// URL.
    pub fn validate(&self) -> Result<(), SalaError> {
        let parsed = url::Url::parse(&self.service_url)
            .map_err(|e| SalaError::Config(format!("service url '{}': {e}", self.service_url)))?;
        match parsed.scheme() {
            "ws" | "wss" => Ok(()),
            other => Err(SalaError::Config(format!(
                "service url scheme must be ws or wss, got '{other}'"
            ))),
        }
    }
}
