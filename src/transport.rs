//! HTTP transport shared by every component.
//!
//! Components never talk to `reqwest` directly; they hand an [`HttpRequest`]
//! to a [`Transport`] and get status plus body back. This keeps retry and
//! parsing logic testable without a network.

use crate::error::TransportError;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::HeaderMap;
use std::time::Duration;

/// Used when the configured user-agent pool is empty.
const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// An outbound GET request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Creates a GET request with no extra headers.
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: HeaderMap::new(),
            timeout,
        }
    }

    /// Replaces the request headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Status and decoded body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for any status below 400.
    pub fn is_ok(&self) -> bool {
        self.status < 400
    }
}

/// Capability to send a GET request and read the whole response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport backed by a pooled `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default client settings.
    pub fn new() -> Result<Self, TransportError> {
        Ok(Self::with_client(create_http_client()?))
    }

    /// Wraps an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", request.url, e)))?;

        tracing::debug!(url = %url, "GET");
        let timeout = request.timeout;
        let response = self
            .client
            .get(url)
            .headers(request.headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| timeout_or_http(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| timeout_or_http(e, timeout))?;

        Ok(HttpResponse { status, body })
    }
}

fn timeout_or_http(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Http(err)
    }
}

/// Common HTTP client configuration.
///
/// The cookie store keeps whatever the site sets between calls, the way a
/// browser session would. Explicit `Cookie` headers take precedence.
pub fn create_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(30))
        .build()
}

/// Picks a random user agent from the pool.
pub fn random_user_agent(pool: &[String]) -> &str {
    pool.choose(&mut rand::thread_rng())
        .map(String::as_str)
        .unwrap_or(FALLBACK_USER_AGENT)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_from_pool() {
        let pool = vec!["ua-one".to_string(), "ua-two".to_string()];
        for _ in 0..20 {
            let ua = random_user_agent(&pool);
            assert!(ua == "ua-one" || ua == "ua-two");
        }
    }

    #[test]
    fn test_random_user_agent_empty_pool() {
        assert_eq!(random_user_agent(&[]), FALLBACK_USER_AGENT);
    }

    #[test]
    fn test_response_is_ok() {
        assert!(HttpResponse::new(200, "").is_ok());
        assert!(HttpResponse::new(302, "").is_ok());
        assert!(!HttpResponse::new(403, "").is_ok());
        assert!(!HttpResponse::new(500, "").is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let transport = ReqwestTransport::new().unwrap();
        let err = transport
            .get(HttpRequest::get("not a url", Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }
}
