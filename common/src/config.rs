use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration.
///
/// Loaded from `<config dir>/bioslide/config.json` when present, then
/// overridden by environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BioslideConfig {
    /// Key for the hosted chat model. Without it a stub model is used.
    pub api_key: Option<String>,
    pub model: String,
    /// OpenAI-compatible API root, without the trailing `/chat/completions`.
    pub base_url: String,
    pub serper_api_key: Option<String>,
    /// Language the model should answer in.
    pub language: String,
    pub debounce_ms: u64,
    pub probe_timeout_ms: u64,
    pub transition_delay_ms: u64,
    pub log_path: Option<PathBuf>,
}

impl Default for BioslideConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            serper_api_key: None,
            language: "Armenian".to_string(),
            debounce_ms: 500,
            probe_timeout_ms: 5000,
            transition_delay_ms: 1000,
            log_path: None,
        }
    }
}

impl BioslideConfig {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find config directory"))?
            .join("bioslide");
        Ok(config_dir.join("config.json"))
    }

    /// Load the config file (if any) and apply environment overrides.
    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let config = Self::load_from(&path).await?;
        Ok(config.apply_env(|key| std::env::var(key).ok()))
    }

    /// Load configuration from a specific file; a missing file yields defaults.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: BioslideConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty("BIOSLIDE_MODEL") {
            self.model = model;
        }
        if let Some(url) = non_empty("BIOSLIDE_BASE_URL") {
            self.base_url = url;
        }
        if let Some(key) = non_empty("SERPER_API_KEY") {
            self.serper_api_key = Some(key);
        }
        if let Some(language) = non_empty("BIOSLIDE_LANGUAGE") {
            self.language = language;
        }
        if let Some(path) = non_empty("BIOSLIDE_LOG_PATH") {
            self.log_path = Some(PathBuf::from(path));
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("bioslide.log"))
    }

    /// Save configuration to the default location.
    pub async fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }
}
