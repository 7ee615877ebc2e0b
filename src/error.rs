//! Error types for the Fanqie client.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use crate::cookies::CookieError;
use thiserror::Error;

/// Main error type for scraping operations.
#[derive(Error, Debug)]
pub enum ScraperError {
    /// No session cookie could be obtained.
    #[error(transparent)]
    Cookie(#[from] CookieError),

    /// The request could not be built or sent.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The client configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No book ID could be recovered from the input
    #[error("Could not resolve book id: {0}")]
    Resolution(String),

    /// Server returned a non-200 status, or retries ran out
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Response body did not have the expected shape
    #[error("Unexpected response data: {0}")]
    DataShape(String),
}

/// Error type for the HTTP transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A header value contained characters HTTP does not allow
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// URL parsing or validation failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No complete response within the request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}
