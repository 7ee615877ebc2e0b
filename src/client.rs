//! The client context every component runs against.
//!
//! [`FanqieClient`] owns the transport, the configuration, the cookie store
//! and the book ID extractor. The component modules (`resolver`, `metadata`,
//! `chapters`, `content`) each add their operations to it.

use crate::config::Config;
use crate::cookies::{CookieError, CookieStore};
use crate::error::{ConfigError, ScraperError, TransportError};
use crate::resolver::{BookIdExtractor, PatternExtractor};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, random_user_agent};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use std::sync::Arc;

/// Client for fanqienovel.com.
pub struct FanqieClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: Config,
    pub(crate) cookies: CookieStore,
    pub(crate) extractor: Box<dyn BookIdExtractor>,
}

impl FanqieClient {
    /// Creates a client that talks to the network through `reqwest`.
    pub fn new(config: Config) -> Result<Self, ScraperError> {
        let transport = ReqwestTransport::new()?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a client on top of a custom transport.
    pub fn with_transport(
        config: Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ScraperError> {
        config.validate()?;

        let cookies = CookieStore::new(config.cookie_path()?, &config);
        let extractor = PatternExtractor::new(config.extraction.book_id_patterns.as_slice()).map_err(|e| {
            ConfigError::InvalidValue {
                key: "extraction.book_id_patterns".to_string(),
                message: e.to_string(),
            }
        })?;

        Ok(Self {
            transport,
            config,
            cookies,
            extractor: Box::new(extractor),
        })
    }

    /// Replaces the book ID extractor used during resolution.
    pub fn with_extractor(mut self, extractor: impl BookIdExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cookie_store(&self) -> &CookieStore {
        &self.cookies
    }

    /// Returns the session cookie, minting one if needed.
    pub async fn get_cookie(&self) -> Result<String, CookieError> {
        self.cookies.get_cookie(self.transport.as_ref()).await
    }

    /// Builds request headers with a random user agent and a session cookie.
    ///
    /// Without an explicit `cookie` this goes through [`Self::get_cookie`],
    /// which may probe the site and write the cookie file.
    pub async fn get_headers(&self, cookie: Option<&str>) -> Result<HeaderMap, ScraperError> {
        let cookie = match cookie {
            Some(cookie) => cookie.to_string(),
            None => self.get_cookie().await?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(random_user_agent(&self.config.request.user_agents))
                .map_err(TransportError::from)?,
        );
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie).map_err(TransportError::from)?,
        );
        Ok(headers)
    }

    /// GETs a platform page with session headers.
    pub(crate) async fn fetch_page(&self, url: &str) -> Result<HttpResponse, ScraperError> {
        let headers = self.get_headers(None).await?;
        let request = HttpRequest::get(url, self.config.request.timeout()).with_headers(headers);
        Ok(self.transport.get(request).await?)
    }
}
