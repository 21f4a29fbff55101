use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Local callback server used for the OAuth redirect, the player page and
/// the device WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path Spotify redirects to after login. Must match the redirect URI
    /// registered for the client id.
    #[serde(default = "default_redirect_path")]
    pub redirect_path: String,
    /// Host name the browser uses to reach this process.
    #[serde(default = "default_public_host")]
    pub public_host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Number of data rows materialized in the album list at a time.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Labels longer than this are cut and suffixed with "...".
    #[serde(default = "default_column_width")]
    pub column_width: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Saved albums requested per remote page (Spotify allows at most 50).
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_accounts_url")]
    pub accounts_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            redirect_path: default_redirect_path(),
            public_host: default_public_host(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            window_size: default_window_size(),
            column_width: default_column_width(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            base_url: default_base_url(),
            accounts_url: default_accounts_url(),
        }
    }
}

impl HttpConfig {
    /// Base URL the browser uses, e.g. `http://localhost:8888`.
    pub fn public_base_url(&self) -> String {
        format!("http://{}:{}", self.public_host, self.port)
    }

    /// `redirect_path` with surrounding whitespace removed and exactly one
    /// leading slash.
    pub fn callback_path(&self) -> String {
        format!("/{}", self.redirect_path.trim().trim_start_matches('/'))
    }

    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.public_base_url(), self.callback_path())
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_redirect_path() -> String {
    "/spotify-cli".to_string()
}

fn default_public_host() -> String {
    "localhost".to_string()
}

fn default_refresh_interval_ms() -> u64 {
    500
}

fn default_window_size() -> usize {
    45
}

fn default_column_width() -> usize {
    20
}

fn default_page_size() -> usize {
    25
}

fn default_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
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
}
