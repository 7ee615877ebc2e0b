//! Fanqie - fanqienovel.com novel downloader.
//!
//! This library provides functionality for:
//! - Obtaining and persisting the anonymous session cookie the site expects
//! - Resolving book IDs from bare IDs and page, reader or keyword links
//! - Fetching book metadata and chapter lists
//! - Downloading chapter text with retries and cleaning it for reading

pub mod chapters;
pub mod client;
pub mod config;
pub mod console;
pub mod content;
pub mod cookies;
pub mod error;
pub mod metadata;
pub mod resolver;
pub mod transport;

// Re-export commonly used types
pub use chapters::{ChapterRecord, normalize_chapter_title};
pub use client::FanqieClient;
pub use config::Config;
pub use console::Console;
pub use content::clean_content;
pub use cookies::{CookieError, CookieStore};
pub use error::{ConfigError, ScraperError, TransportError};
pub use metadata::BookInfo;
pub use resolver::{BookId, BookIdExtractor, PatternExtractor};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
