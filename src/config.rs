use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_CRITICAL_TRIGGERS;
use crate::error::ConfigError;

const APP_DIR: &str = "GemPlay";
const ENGINE_CONFIG_FILE: &str = "sound-engine.json";
const SETTINGS_FILE: &str = "sound-settings.json";

/// Environment override for the API base URL
pub const ENV_API_URL: &str = "GEMPLAY_API_URL";
/// Environment override for the bearer token
pub const ENV_API_TOKEN: &str = "GEMPLAY_API_TOKEN";

/// Directory holding engine config, settings and logs
pub fn app_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(ConfigError::NoConfigDir)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ConfigError> {
    let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
        path: path.display().to_string(),
        source,
    };

    let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
    serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
        path: path.display().to_string(),
        source,
    };

    let json = serde_json::to_string_pretty(value).map_err(|e| save_failed(Box::new(e)))?;
    fs::write(path, json).map_err(|e| save_failed(Box::new(e)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the GemPlay API
    pub api_base_url: String,

    /// Bearer token for the admin sound endpoints
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Timeout for catalog and asset requests
    pub request_timeout_secs: u64,

    /// Triggers whose audio is decoded at startup
    #[serde(default = "default_critical_triggers")]
    pub critical_triggers: Vec<String>,
}

fn default_critical_triggers() -> Vec<String> {
    DEFAULT_CRITICAL_TRIGGERS.iter().map(|t| t.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            auth_token: None,
            request_timeout_secs: 10,
            critical_triggers: default_critical_triggers(),
        }
    }
}

impl EngineConfig {
    /// Load from the platform config directory.
    /// Creates a default config if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = app_config_dir()?.join(ENGINE_CONFIG_FILE);
        let config = Self::load_from(&path)?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let config: EngineConfig = read_json(path)?;
            config.validate()?;
            tracing::info!("Loaded engine config from {}", path.display());
            Ok(config)
        } else {
            let config = EngineConfig::default();
            write_json(path, &config)?;
            tracing::info!("Created default engine config at {}", path.display());
            Ok(config)
        }
    }

    /// Apply `GEMPLAY_API_URL` / `GEMPLAY_API_TOKEN` on top of the file values
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.auth_token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// User-facing sound settings, persisted under a single key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundSettings {
    pub enabled: bool,
    pub volume: f32,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.7,
        }
    }
}

impl SoundSettings {
    pub fn new(enabled: bool, volume: f32) -> Self {
        Self {
            enabled,
            volume: sanitize_volume(volume),
        }
    }
}

fn sanitize_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Persistence for `SoundSettings`
pub trait SettingsStore: Send + Sync {
    /// Stored settings, or `None` when nothing has been saved yet
    fn load(&self) -> Result<Option<SoundSettings>, ConfigError>;

    fn save(&self, settings: &SoundSettings) -> Result<(), ConfigError>;
}

/// Settings kept in a JSON file
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/GemPlay/sound-settings.json`
    pub fn in_config_dir() -> Result<Self, ConfigError> {
        Ok(Self::new(app_config_dir()?.join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<Option<SoundSettings>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let settings: SoundSettings = read_json(&self.path)?;
        Ok(Some(SoundSettings::new(settings.enabled, settings.volume)))
    }

    fn save(&self, settings: &SoundSettings) -> Result<(), ConfigError> {
        write_json(&self.path, settings)?;
        tracing::debug!("Saved sound settings to {}", self.path.display());
        Ok(())
    }
}

/// Settings held in memory only
#[derive(Default)]
pub struct MemorySettingsStore {
    value: Mutex<Option<SoundSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SoundSettings) -> Self {
        Self {
            value: Mutex::new(Some(settings)),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<SoundSettings>, ConfigError> {
        Ok(*self.value.lock())
    }

    fn save(&self, settings: &SoundSettings) -> Result<(), ConfigError> {
        *self.value.lock() = Some(*settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("gemplay-sounds-{}-{}", std::process::id(), name))
            .join("file.json")
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.auth_token.is_none());
        assert!(config.critical_triggers.iter().any(|t| t == "victory"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_created_then_reloaded() {
        let path = temp_path("engine");
        let _ = fs::remove_file(&path);

        let created = EngineConfig::load_from(&path).unwrap();
        assert!(path.exists());

        let reloaded = EngineConfig::load_from(&path).unwrap();
        assert_eq!(created.api_base_url, reloaded.api_base_url);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.api_base_url = "ftp://example".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::default().with_env_overrides(|key| match key {
            ENV_API_URL => Some("https://api.gemplay.test".to_string()),
            ENV_API_TOKEN => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://api.gemplay.test");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));

        let untouched = EngineConfig::default().with_env_overrides(|_| Some(String::new()));
        assert_eq!(untouched.api_base_url, EngineConfig::default().api_base_url);
        assert!(untouched.auth_token.is_none());
    }

    #[test]
    fn test_settings_volume_is_clamped() {
        assert_eq!(SoundSettings::new(true, 1.7).volume, 1.0);
        assert_eq!(SoundSettings::new(true, -0.2).volume, 0.0);
        assert_eq!(SoundSettings::new(true, f32::NAN).volume, 0.0);
    }

    #[test]
    fn test_json_settings_store() {
        let path = temp_path("settings");
        let store = JsonSettingsStore::new(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(store.load().unwrap(), None);

        let settings = SoundSettings::new(false, 0.25);
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), Some(settings));

        let json = fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"enabled\": false"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_memory_settings_store() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&SoundSettings::default()).unwrap();
        assert_eq!(store.load().unwrap(), Some(SoundSettings::default()));
    }

    #[test]
    fn test_memory_settings_store_seeded() {
        let store = MemorySettingsStore::with_settings(SoundSettings::new(false, 0.25));
        assert_eq!(store.load().unwrap(), Some(SoundSettings::new(false, 0.25)));
    }
}
