use crate::core::error::ObchatError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_visual_items() -> u32 {
    1
}

/// Application configuration loaded from `~/.obchat/config.yaml`.
///
/// Distinct from [`crate::settings::ChatSettings`]: this file describes how to
/// reach the backend, the settings file describes what to ask it for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Requests that stall past this are surfaced as network failures.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Use the legacy JSON chat endpoint instead of the multipart one.
    #[serde(default)]
    pub legacy_api: bool,
    #[serde(default = "default_max_visual_items")]
    pub max_visual_items: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: default_backend_url(),
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            legacy_api: false,
            max_visual_items: default_max_visual_items(),
        }
    }
}

impl Config {
    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".obchat")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    pub fn load() -> Result<Config, ObchatError> {
        let path = Self::config_path();

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config = serde_yml::from_str::<Config>(&contents)
                .map_err(|e| ObchatError::Config(format!("Parse {}: {}", path.display(), e)))?;
            return Ok(config);
        }

        let config = Config::default();
        let _ = config.save();
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ObchatError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yml::to_string(self)?;
        fs::write(&path, yaml_content)?;
        Ok(())
    }

    /// Where chat settings chosen in the session are persisted.
    pub fn settings_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Directory for saved conversation transcripts.
    pub fn history_dir() -> PathBuf {
        Self::config_dir().join("history")
    }
}
