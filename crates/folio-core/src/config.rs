use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the Folio client.
///
/// Loaded from `~/.folio/config.toml` by default. Each section corresponds
/// to one concern: general process settings, the backend endpoint, and the
/// chat request parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub chat: ChatSettings,
}

impl FolioConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FolioConfig = toml::from_str(&content)?;
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
        let content = toml::to_string_pretty(self)?;
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
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Backend endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the document-chat backend.
    pub base_url: String,
    /// Request timeout in seconds for non-streaming calls.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Chat request parameters sent with every message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Use the streaming endpoint instead of whole-response chat.
    pub streaming: bool,
    /// Ask the backend to retrieve document context for the answer.
    pub use_context: bool,
    /// Number of context chunks to retrieve (backend clamps to 1..=20).
    pub k: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the generated answer.
    pub max_tokens: usize,
    /// Number of prior turns sent as conversation history.
    pub history_turns: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            streaming: true,
            use_context: true,
            k: 5,
            temperature: 0.7,
            max_tokens: 1024,
            history_turns: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FolioConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.timeout_secs, 120);
        assert!(config.chat.streaming);
        assert!(config.chat.use_context);
        assert_eq!(config.chat.k, 5);
        assert_eq!(config.chat.history_turns, 10);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let config = FolioConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = FolioConfig::default();
        config.backend.base_url = "http://10.0.0.2:9000".to_string();
        config.chat.k = 3;
        config.chat.streaming = false;
        config.save(&path).unwrap();

        let loaded = FolioConfig::load(&path).unwrap();
        assert_eq!(loaded.backend.base_url, "http://10.0.0.2:9000");
        assert_eq!(loaded.chat.k, 3);
        assert!(!loaded.chat.streaming);
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend]\nbase_url = \"http://host:8001\"\n").unwrap();

        let loaded = FolioConfig::load(&path).unwrap();
        assert_eq!(loaded.backend.base_url, "http://host:8001");
        // Unspecified fields keep their defaults.
        assert_eq!(loaded.backend.timeout_secs, 120);
        assert_eq!(loaded.general.log_level, "info");
        assert_eq!(loaded.chat.k, 5);
    }

    #[test]
    fn test_load_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = [[[").unwrap();

        assert!(FolioConfig::load(&path).is_err());
        let fallback = FolioConfig::load_or_default(&path);
        assert_eq!(fallback.backend.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.toml");
        FolioConfig::default().save(&path).unwrap();
        assert!(path.exists());
    }
}
