use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, ShipchatError};

/// Top-level configuration for the shipchat assistant.
///
/// Loaded from `~/.shipchat/config.toml` by default. Each section covers one
/// tier of the transport chain or one ambient concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipchatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub dialogue: DialogueConfig,
}

impl ShipchatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ShipchatConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ShipchatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Display name sent to remote tiers when the caller supplies none.
    pub user_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            user_name: "عميل".to_string(),
        }
    }
}

/// Realtime duplex channel tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub enabled: bool,
    /// `host:port` of the duplex analysis service.
    pub address: String,
    /// How long to wait for a correlated `chat_response`.
    pub response_timeout_ms: u64,
    /// How long to wait for the connection to open.
    pub connect_timeout_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "127.0.0.1:5001".to_string(),
            response_timeout_ms: 3_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl RealtimeConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Stateless HTTP inference tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    /// Base URL; `/chat` and `/health` are appended.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Run the one-time `/health` probe when the engine starts.
    pub probe_on_start: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_secs: 12,
            probe_on_start: true,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logistics business API consumed by the action dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub endpoints: EndpointPaths,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_secs: 15,
            endpoints: EndpointPaths::default(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Relative paths of the business endpoints. `{id}` is substituted by the
/// shipment id for the cancel route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPaths {
    pub create_shipment: String,
    pub track_shipment: String,
    pub cancel_shipment: String,
    pub list_shipments: String,
    pub list_orders: String,
    pub profile: String,
    pub search: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            create_shipment: "/shipments".to_string(),
            track_shipment: "/shipments/track".to_string(),
            cancel_shipment: "/shipments/{id}/cancel".to_string(),
            list_shipments: "/shipments/my".to_string(),
            list_orders: "/orders".to_string(),
            profile: "/customers/me".to_string(),
            search: "/search".to_string(),
        }
    }
}

/// Conversation-level limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Number of recent messages forwarded to remote tiers.
    pub history_turns: usize,
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            history_turns: 10,
            max_message_length: 2_000,
        }
    }
}
