use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

pub const ENV_API_KEY: &str = "YOUTUBE_API_KEY";
pub const ENV_CHANNEL_ID: &str = "YOUTUBE_CHANNEL_ID";
pub const ENV_RELAY_URL: &str = "CONTACT_RELAY_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub contact: ContactConfig,
}

/// Video platform credentials and endpoints.
///
/// `api_key` and `channel_id` are optional: without them the episode feed
/// serves its placeholder and the live poller never starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default = "default_playlist_id")]
    pub playlist_id: String,
    /// Base URL of the Data API, without a trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// JSON file backing the episode cache.
    #[serde(default = "default_cache_file")]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Form-relay endpoint the contact form is posted to.
    #[serde(default)]
    pub relay_url: Option<String>,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            channel_id: None,
            playlist_id: default_playlist_id(),
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl YouTubeConfig {
    /// API key, treating an empty value as absent.
    pub fn api_key(&self) -> Option<&str> {
        non_empty(self.api_key.as_deref())
    }

    /// Channel id, treating an empty value as absent.
    pub fn channel_id(&self) -> Option<&str> {
        non_empty(self.channel_id.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl LiveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file: default_cache_file(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl ContactConfig {
    pub fn relay_url(&self) -> Option<&str> {
        non_empty(self.relay_url.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn default_playlist_id() -> String {
    "PLWqV6B9T3zV71MaKvAH4QR7gnd5onhwCi".to_string()
}

fn default_api_base() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_poll_interval_secs() -> u64 {
    5 * 60
}

fn default_cache_file() -> PathBuf {
    platform::cache_dir().join("cache.json")
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

impl Config {
    /// Load `config.toml`, writing the defaults on first run, then apply
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)?
        } else {
            let config = Self::default();
            config.save()?;
            config
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Overlay credentials from the environment. Set-but-empty variables
    /// clear the file value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.youtube.api_key = Some(key);
        }
        if let Some(channel) = lookup(ENV_CHANNEL_ID) {
            self.youtube.channel_id = Some(channel);
        }
        if let Some(url) = lookup(ENV_RELAY_URL) {
            self.contact.relay_url = Some(url);
        }
    }
}
