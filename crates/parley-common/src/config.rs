use serde::{Deserialize, Serialize};

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Pages the client sends the user to on auth and policy failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Routes {
    pub login: String,
    pub activation_failed: String,
    pub suspended: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            login: "/users/login".to_owned(),
            activation_failed: "/users/account-activation/failed".to_owned(),
            suspended: "/users/account-suspended".to_owned(),
        }
    }
}

impl Routes {
    pub fn login_inactive(&self) -> String {
        format!("{}?status=inactive", self.login)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Scheme and host of the API server, e.g. `https://answers.example.com`.
    pub base_url: String,
    pub api_prefix: String,
    /// Sent as `Accept-Language` when the user hasn't picked a locale.
    pub default_locale: String,
    pub toast_duration_ms: u64,
    pub draft_autosave_ms: u64,
    pub request_timeout_secs: u64,
    pub routes: Routes,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9080".to_owned(),
            api_prefix: "/api/v1".to_owned(),
            default_locale: "en_US".to_owned(),
            toast_duration_ms: 5000,
            draft_autosave_ms: 3000,
            request_timeout_secs: 30,
            routes: Routes::default(),
        }
    }
}

impl ClientConfig {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, ConfigError> {
        loader.load().await
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), ConfigError> {
        saver.save(self).await
    }

    /// Apply `PARLEY_BASE_URL` and `PARLEY_LOCALE` overrides.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup("PARLEY_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(locale) = lookup("PARLEY_LOCALE").filter(|v| !v.is_empty()) {
            self.default_locale = locale;
        }
        self
    }

    /// Full URL for an API path such as `/question`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn draft_autosave(&self) -> Duration {
        Duration::from_millis(self.draft_autosave_ms)
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    fn load(&self) -> impl Future<Output = Result<ClientConfig, ConfigError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    fn save(&self, config: &ClientConfig) -> impl Future<Output = Result<(), ConfigError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
///
/// The format follows the file extension: `.json` or `.toml`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, contents: String) -> Result<(), ConfigError> {
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn unsupported(&self) -> ConfigError {
        ConfigError::UnsupportedFormat {
            path: self.path.clone(),
        }
    }
}

impl Loader for FileStore {
    async fn load(&self) -> Result<ClientConfig, ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&self.read()?)?),
            Some("toml") => Ok(toml::from_str(&self.read()?)?),
            _ => Err(self.unsupported()),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &ClientConfig) -> Result<(), ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => self.write(serde_json::to_string_pretty(config)?),
            Some("toml") => self.write(toml::to_string_pretty(config)?),
            _ => Err(self.unsupported()),
        }
    }
}
