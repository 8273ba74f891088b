//! frontdesk configuration
//!
//! YAML configuration file with serde defaults for everything that has a
//! sensible default. Only the upstream system id, the API token, and the
//! zero point have to be supplied.

use crate::error::CoreError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default base URL of the remote persona API
pub const DEFAULT_API_BASE: &str = "https://api.pluralkit.me/v2";
/// Default polling cadence in minutes
pub const DEFAULT_UPDATE_INTERVAL: u32 = 5;
/// Default data directory (home-relative, expanded at load time)
pub const DEFAULT_DATA_DIR: &str = "~/.frontdesk/data";

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_update_interval() -> u32 {
    DEFAULT_UPDATE_INTERVAL
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote persona API configuration
    pub api: ApiConfig,
    /// Directory holding the persisted JSON documents
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Polling cadence in minutes
    #[serde(default = "default_update_interval")]
    pub update_interval: u32,
    /// Outbound webhook notifications
    #[serde(default)]
    pub webhooks: WebhooksConfig,
}

/// Remote persona API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Upstream system identifier
    pub system_id: String,
    /// Bearer-style API token
    pub token: String,
    /// API base URL
    #[serde(default = "default_api_base")]
    pub base_url: String,
    /// Sentinel timestamp meaning "before all recorded history"
    pub zero_point: DateTime<Utc>,
}

/// Webhook notification channels
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhooksConfig {
    /// Full notification: names, pronouns, last-fronted details
    #[serde(default)]
    pub full: Option<WebhookConfig>,
    /// Filtered notification: names only, private members masked
    #[serde(default)]
    pub filtered: Option<WebhookConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    pub url: String,
}

impl Config {
    pub fn load(path: &Option<String>) -> Result<Self, CoreError> {
        let config_path = if let Some(p) = path {
            PathBuf::from(p)
        } else {
            // Default locations
            let default_paths = vec![
                Some(PathBuf::from("./frontdesk.yaml")),
                dirs::home_dir().map(|h| h.join(".frontdesk/config.yaml")),
                dirs::config_dir().map(|c| c.join("frontdesk.yaml")),
            ];

            default_paths
                .into_iter()
                .flatten()
                .find(|p| p.exists())
                .ok_or_else(|| {
                    CoreError::ConfigNotFound(
                        "no frontdesk.yaml found; run `frontdesk config-sample` to generate one"
                            .to_string(),
                    )
                })?
        };

        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| CoreError::ConfigParse(format!("read failed: {}", e)))?;

        let config: Config = serde_yml::from_str(&content)
            .map_err(|e| CoreError::ConfigParse(format!("parse failed: {}", e)))?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let content = serde_yml::to_string(self)
            .map_err(|e| CoreError::ConfigParse(format!("serialize failed: {}", e)))?;

        std::fs::write(path, content).map_err(CoreError::Io)?;

        Ok(())
    }

    /// The data directory with a leading `~` expanded to the home
    /// directory.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(rest) = self.data_dir.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.data_dir)
    }

    /// Generate a sample configuration file
    pub fn sample() -> Self {
        Config {
            api: ApiConfig {
                system_id: "abcde".to_string(),
                token: "your-api-token".to_string(),
                base_url: default_api_base(),
                zero_point: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            },
            data_dir: default_data_dir(),
            update_interval: default_update_interval(),
            webhooks: WebhooksConfig {
                full: Some(WebhookConfig {
                    enabled: false,
                    url: "https://discord.com/api/webhooks/<id>/<token>".to_string(),
                }),
                filtered: Some(WebhookConfig {
                    enabled: false,
                    url: "https://discord.com/api/webhooks/<id>/<token>".to_string(),
                }),
            },
        }
    }
}
