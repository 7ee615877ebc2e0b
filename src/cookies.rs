//! Session cookie store.
//!
//! The platform hands out content to anonymous sessions identified by a
//! `novel_web_id` cookie. The store keeps one such cookie in a JSON file and
//! mints a fresh one with a probe request when the file is missing or
//! unreadable.

use crate::config::Config;
use crate::transport::{HttpRequest, Transport, random_user_agent};
use rand::Rng;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Smallest and largest generated `novel_web_id` (19 digits).
const WEB_ID_MIN: u64 = 1_000_000_000_000_000_000;
const WEB_ID_MAX: u64 = 9_999_999_999_999_999_999;

/// Errors that can occur while obtaining a session cookie.
#[derive(Error, Debug)]
pub enum CookieError {
    /// Every probe attempt failed.
    #[error(
        "Failed to obtain a session cookie after {attempts} attempts\n\
         Possible causes:\n\
         1. Network connectivity problems\n\
         2. The server is blocking requests\n\
         3. The cookie file is not writable\n\
         Last error: {}",
        .last_error.as_deref().unwrap_or("none")
    )]
    GenerationFailed {
        attempts: u32,
        last_error: Option<String>,
    },
}

/// Loads, persists and mints the session cookie.
pub struct CookieStore {
    path: PathBuf,
    probe_url: String,
    user_agents: Vec<String>,
    timeout: Duration,
    attempts: u32,
    retry_delay: Duration,
    /// Serializes the read-then-maybe-write sequence within this process.
    lock: Mutex<()>,
}

impl CookieStore {
    /// Creates a store persisting to `path`, probing the configured site.
    pub fn new(path: PathBuf, config: &Config) -> Self {
        Self {
            path,
            probe_url: config.endpoints.site_base_url.clone(),
            user_agents: config.request.user_agents.clone(),
            timeout: config.request.timeout(),
            attempts: config.request.cookie_attempts,
            retry_delay: config.request.cookie_retry_delay(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the persisted cookie.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted cookie, or mints and persists a new one.
    ///
    /// A persisted value is trusted as-is; delete the file to force a new
    /// cookie.
    pub async fn get_cookie(&self, transport: &dyn Transport) -> Result<String, CookieError> {
        let _guard = self.lock.lock().await;

        let last_error = match self.load().await {
            Ok(Some(cookie)) => return Ok(cookie),
            Ok(None) => None,
            Err(diagnostic) => {
                tracing::warn!(path = %self.path.display(), "{}", diagnostic);
                Some(diagnostic)
            }
        };

        self.generate(transport, last_error).await
    }

    /// Reads the cookie file. `Ok(None)` means there is no file yet.
    async fn load(&self) -> Result<Option<String>, String> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(format!(
                    "Failed to read cookie file '{}': {}",
                    self.path.display(),
                    e
                ));
            }
        };

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(serde_json::Value::String(cookie)) => Ok(Some(cookie)),
            Ok(_) => Err(format!(
                "Cookie file '{}' does not contain a string",
                self.path.display()
            )),
            Err(e) => Err(format!(
                "Cookie file '{}' is not valid JSON: {}",
                self.path.display(),
                e
            )),
        }
    }

    async fn generate(
        &self,
        transport: &dyn Transport,
        mut last_error: Option<String>,
    ) -> Result<String, CookieError> {
        for attempt in 1..=self.attempts {
            let web_id = random_web_id();
            match self.probe(transport, web_id).await {
                Ok(cookie) => {
                    tracing::info!(path = %self.path.display(), "Generated new session cookie");
                    return Ok(cookie);
                }
                Err(diagnostic) => {
                    let diagnostic = format!(
                        "Cookie generation failed (attempt {}/{}): {}",
                        attempt, self.attempts, diagnostic
                    );
                    tracing::warn!("{}", diagnostic);
                    last_error = Some(diagnostic);
                    if attempt < self.attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        Err(CookieError::GenerationFailed {
            attempts: self.attempts,
            last_error,
        })
    }

    /// Sends one probe with the candidate id and persists it on success.
    async fn probe(&self, transport: &dyn Transport, web_id: u64) -> Result<String, String> {
        let cookie = format!("novel_web_id={}", web_id);

        let mut headers = HeaderMap::new();
        let user_agent = random_user_agent(&self.user_agents);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| e.to_string())?,
        );
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie).map_err(|e| e.to_string())?,
        );

        let request = HttpRequest::get(&self.probe_url, self.timeout).with_headers(headers);
        let response = transport.get(request).await.map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("probe returned HTTP {}", response.status));
        }

        self.persist(&cookie).await.map_err(|e| {
            format!(
                "could not write cookie file '{}': {}",
                self.path.display(),
                e
            )
        })?;
        Ok(cookie)
    }

    async fn persist(&self, cookie: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(cookie).map_err(std::io::Error::other)?;
        tokio::fs::write(&self.path, json).await
    }
}

fn random_web_id() -> u64 {
    rand::thread_rng().gen_range(WEB_ID_MIN..=WEB_ID_MAX)
}
