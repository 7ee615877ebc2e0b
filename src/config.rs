//! Configuration management for the Fanqie client.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application name used for config directory.
const APP_NAME: &str = "Fanqie";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Default cookie filename, stored next to the config file.
const COOKIE_FILENAME: &str = "cookie.json";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outbound request behavior.
    pub request: RequestConfig,

    /// Platform endpoints.
    pub endpoints: EndpointsConfig,

    /// Book ID extraction patterns.
    pub extraction: ExtractionConfig,

    /// File paths.
    pub paths: PathsConfig,
}

/// Request behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// User agents picked at random for each request.
    pub user_agents: Vec<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_sec: u64,

    /// Attempts made when downloading a chapter.
    pub max_retries: u32,

    /// Probe attempts made when minting a new session cookie.
    pub cookie_attempts: u32,

    /// Pause between failed cookie probes in milliseconds.
    pub cookie_retry_delay_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15".to_string(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            ],
            request_timeout_sec: 10,
            max_retries: 3,
            cookie_attempts: 10,
            cookie_retry_delay_ms: 500,
        }
    }
}

impl RequestConfig {
    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec)
    }

    /// Returns the pause between failed cookie probes.
    pub fn cookie_retry_delay(&self) -> Duration {
        Duration::from_millis(self.cookie_retry_delay_ms)
    }
}

/// Base URLs of the services the client talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Main site, used for the cookie probe and book landing pages.
    pub site_base_url: String,

    /// Host serving the chapter list.
    pub chapter_api_base_url: String,

    /// Chapter content endpoint, queried with `item_id`.
    pub content_api_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            site_base_url: "https://fanqienovel.com".to_string(),
            chapter_api_base_url: "https://api5-normal-lf.fqnovel.com".to_string(),
            content_api_url: "https://api.cengui.cn/api/tomato/content.php".to_string(),
        }
    }
}

impl EndpointsConfig {
    /// Landing page of a book.
    pub fn book_page_url(&self, book_id: &str) -> String {
        format!("{}/page/{}", self.site_base_url.trim_end_matches('/'), book_id)
    }

    /// Chapter list endpoint of a book.
    pub fn chapter_list_url(&self, book_id: &str) -> String {
        format!(
            "{}/reading/bookapi/search/{}/v",
            self.chapter_api_base_url.trim_end_matches('/'),
            book_id
        )
    }

    /// Content endpoint of a chapter.
    pub fn content_url(&self, chapter_id: &str) -> String {
        format!("{}?item_id={}", self.content_api_url, chapter_id)
    }
}

/// Patterns used to find a book ID inside fetched pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Regexes tried in order; the first capture group is the book ID.
    /// Field patterns go first so stray `/page/` links don't win.
    pub book_id_patterns: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            book_id_patterns: vec![
                r#""bookId"\s*:\s*"(\d+)""#.to_string(),
                r#""book_id"\s*:\s*"(\d+)""#.to_string(),
                r#""book_id"\s*:\s*(\d+)"#.to_string(),
                r#""bookId"\s*:\s*(\d+)"#.to_string(),
                r"/page/(\d+)".to_string(),
            ],
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Where the session cookie is persisted.
    /// Defaults to `cookie.json` in the config directory.
    pub cookie_file: Option<PathBuf>,
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request.user_agents.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "request.user_agents".to_string(),
                message: "at least one user agent is required".to_string(),
            });
        }

        let positive = [
            ("request.request_timeout_sec", self.request.request_timeout_sec),
            ("request.max_retries", u64::from(self.request.max_retries)),
            ("request.cookie_attempts", u64::from(self.request.cookie_attempts)),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }

        for pattern in &self.extraction.book_id_patterns {
            let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                key: "extraction.book_id_patterns".to_string(),
                message: format!("'{}': {}", pattern, e),
            })?;
            if regex.captures_len() < 2 {
                return Err(ConfigError::InvalidValue {
                    key: "extraction.book_id_patterns".to_string(),
                    message: format!("'{}' has no capture group", pattern),
                });
            }
        }

        Ok(())
    }

    /// Returns the effective cookie file path, using config or default.
    pub fn cookie_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.cookie_file {
            Ok(path.clone())
        } else {
            Ok(Self::config_dir()?.join(COOKIE_FILENAME))
        }
    }
}
