use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment variable holding the weather provider API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WeatherConfig {
    /// Fallback when `OPENWEATHER_API_KEY` is unset.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Hosted backend holding accounts and the `favorites` table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    /// Project URL, e.g. "https://xyz.supabase.co".
    pub url: Option<String>,
    /// Public (anon) API key sent as the `apikey` header.
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocationConfig {
    /// User consent to look up the device position.
    #[serde(default)]
    pub allow: bool,
    pub service_url: Option<String>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [weather]
/// api_key = "..."
///
/// [backend]
/// url = "https://xyz.supabase.co"
/// anon_key = "..."
///
/// [location]
/// allow = true
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

/// Resolved backend endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    pub url: String,
    pub anon_key: String,
}

impl Config {
    /// Load config from the platform config directory, or return an empty
    /// default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherly", "weatherly")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().to_path_buf())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Path to the persisted auth session.
    pub fn session_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("session.toml"))
    }

    /// Weather API key: the environment wins over the config file.
    pub fn weather_api_key(&self) -> Option<String> {
        resolve_api_key(std::env::var(API_KEY_ENV).ok(), self.weather.api_key.as_deref())
    }

    /// Backend URL and anon key, if both are configured.
    pub fn backend_endpoint(&self) -> Option<BackendEndpoint> {
        let url = self.backend.url.as_deref().filter(|u| !u.trim().is_empty())?;
        let anon_key = self.backend.anon_key.as_deref().filter(|k| !k.trim().is_empty())?;

        Some(BackendEndpoint {
            url: url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
        })
    }
}

fn resolve_api_key(env_value: Option<String>, file_value: Option<&str>) -> Option<String> {
    env_value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| file_value.map(str::to_owned))
        .filter(|v| !v.trim().is_empty())
}
