//! Book ID resolution.
//!
//! Users paste whatever they have: a bare ID, a `/page/` link, a `/reader/`
//! link to some chapter, or a `/keyword/` search link. Only the first two
//! carry the real book ID in the URL; the others need a page fetch.

use crate::client::FanqieClient;
use crate::error::ScraperError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Book landing page link; the ID is in the path.
static PAGE_URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fanqienovel\.com/page/(\d+)").unwrap());

const READER_URL_MARKER: &str = "fanqienovel.com/reader/";
const KEYWORD_URL_MARKER: &str = "fanqienovel.com/keyword/";

/// Canonical numeric book identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookId(String);

impl BookId {
    /// Accepts non-empty strings made only of ASCII digits.
    pub fn new(id: &str) -> Option<Self> {
        if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(id.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BookId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Finds a book ID inside raw page text.
pub trait BookIdExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Option<String>;
}

/// Tries an ordered list of regexes and returns the first capture.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    patterns: Vec<Regex>,
}

impl PatternExtractor {
    /// Compiles the patterns; each should have one capture group.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(crate::config::ExtractionConfig::default().book_id_patterns.as_slice())
            .expect("Invalid default book id patterns")
    }
}

impl BookIdExtractor for PatternExtractor {
    fn extract(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
    }
}

impl FanqieClient {
    /// Resolves a bare ID or any supported URL to the canonical book ID.
    pub async fn book_id_from_any_url(&self, input: &str) -> Result<BookId, ScraperError> {
        let s = input.trim();

        if let Some(id) = BookId::new(s) {
            return Ok(id);
        }

        if let Some(id) = PAGE_URL_REGEX
            .captures(s)
            .and_then(|caps| BookId::new(&caps[1]))
        {
            return Ok(id);
        }

        if s.contains(READER_URL_MARKER) {
            return self.parse_book_id_from_reader_url(s).await;
        }

        if s.contains(KEYWORD_URL_MARKER) {
            return self.parse_book_id_from_keyword_url(s).await;
        }

        // Last resort: fetch whatever it is and look for an ID.
        // Failures here are expected and not reported.
        if !s.is_empty() {
            match self.fetch_page(s).await {
                Ok(response) if response.status == 200 => {
                    if let Some(id) = self.extract_book_id(&response.body) {
                        return Ok(id);
                    }
                    tracing::debug!(url = s, "No book id in fetched page");
                }
                Ok(response) => {
                    tracing::debug!(url = s, status = response.status, "Fallback fetch failed");
                }
                Err(e) => {
                    tracing::debug!(url = s, error = %e, "Fallback fetch failed");
                }
            }
        }

        Err(ScraperError::Resolution(format!(
            "cannot resolve a book id from input: {}",
            input
        )))
    }

    /// Resolves a `/reader/<chapter>` link by reading the chapter page.
    pub async fn parse_book_id_from_reader_url(
        &self,
        reader_url: &str,
    ) -> Result<BookId, ScraperError> {
        self.book_id_from_page(reader_url, "reader").await
    }

    /// Resolves a `/keyword/<id>` link by reading the keyword page.
    pub async fn parse_book_id_from_keyword_url(
        &self,
        keyword_url: &str,
    ) -> Result<BookId, ScraperError> {
        self.book_id_from_page(keyword_url, "keyword").await
    }

    /// Runs the configured extractor over raw page text.
    pub fn extract_book_id(&self, text: &str) -> Option<BookId> {
        self.extractor
            .extract(text)
            .and_then(|id| BookId::new(&id))
    }

    async fn book_id_from_page(&self, url: &str, kind: &str) -> Result<BookId, ScraperError> {
        tracing::debug!(url, kind, "Resolving book id from page");
        let response = self.fetch_page(url).await?;
        if response.status != 200 {
            return Err(ScraperError::Connectivity(format!(
                "{} page returned HTTP {}",
                kind, response.status
            )));
        }

        self.extract_book_id(&response.body).ok_or_else(|| {
            ScraperError::Resolution(format!(
                "no book id found in {} page {} (the page layout may have changed)",
                kind, url
            ))
        })
    }
}
