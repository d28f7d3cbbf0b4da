//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;
use crate::application::services::{KasSettings, MAX_MATCH_START_OFFSET_MINUTES};

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub kas: KasConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct KasConfig {
    pub currency_symbol: String,
    pub history_limit: usize,
    pub match_start_offset_minutes: i64,
}

/// Identity the console transport posts as
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConsoleConfig {
    pub source_id: String,
    pub user_id: String,
    pub user_name: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "kas-bot".to_string(),
            prefix: "/".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sqlite,
            path: PathBuf::from("data/kas.db"),
        }
    }
}

impl Default for KasConfig {
    fn default() -> Self {
        let settings = KasSettings::default();
        Self {
            currency_symbol: settings.currency_symbol,
            history_limit: settings.history_limit,
            match_start_offset_minutes: settings.match_start_offset_minutes,
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            source_id: "console@g.us".to_string(),
            user_id: "console-user".to_string(),
            user_name: "Console".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `BOT_PREFIX`, `KAS_DB_PATH` and `KAS_STORAGE`
    pub fn load_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(path) = std::env::var("KAS_DB_PATH") {
            self.storage.path = PathBuf::from(path);
        }

        if let Ok(backend) = std::env::var("KAS_STORAGE") {
            self.storage.backend = match backend.to_lowercase().as_str() {
                "sqlite" => StorageBackend::Sqlite,
                "memory" => StorageBackend::Memory,
                other => return Err(ConfigError::InvalidValue(format!("KAS_STORAGE={}", other))),
            };
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.kas.history_limit == 0 {
            return Err(ConfigError::InvalidValue("kas.history-limit must be at least 1".to_string()));
        }
        if !(0..=MAX_MATCH_START_OFFSET_MINUTES).contains(&self.kas.match_start_offset_minutes) {
            return Err(ConfigError::InvalidValue(format!(
                "kas.match-start-offset-minutes must be between 0 and {}",
                MAX_MATCH_START_OFFSET_MINUTES
            )));
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("storage.path".to_string()));
        }
        Ok(())
    }

    pub fn kas_settings(&self) -> KasSettings {
        KasSettings {
            currency_symbol: self.kas.currency_symbol.clone(),
            history_limit: self.kas.history_limit,
            match_start_offset_minutes: self.kas.match_start_offset_minutes,
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(format!("Failed to render config: {}", e)))
    }
}
