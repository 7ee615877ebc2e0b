//! Chapter content download and cleanup.

use crate::client::FanqieClient;
use crate::error::ScraperError;
use crate::transport::{HttpRequest, random_user_agent};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

static HEADER_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<header>.*?</header>").unwrap());
static FOOTER_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<footer>.*?</footer>").unwrap());
static ARTICLE_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?article>").unwrap());
static PARAGRAPH_OPEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<p idx="\d+">"#).unwrap());
static PARAGRAPH_CLOSE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</p>").unwrap());
static ANY_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
/// Angle brackets left JSON-escaped in the payload.
static ESCAPED_ANGLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u003c|\\u003e").unwrap());

const INDENT: &str = "    ";

/// Content API response.
#[derive(Debug, Deserialize)]
struct ContentResponse {
    code: Option<i64>,
    data: Option<ContentData>,
}

#[derive(Debug, Deserialize)]
struct ContentData {
    content: Option<String>,
    title: Option<String>,
}

/// Turns a raw chapter payload into indented paragraphs.
///
/// Leading lines that repeat the title exactly are dropped; a paragraph
/// that merely starts with the title is kept whole. Cleaning
/// already-cleaned text returns it unchanged.
pub fn clean_content(raw: &str, title: &str) -> String {
    let text = HEADER_BLOCK_REGEX.replace_all(raw, "");
    let text = FOOTER_BLOCK_REGEX.replace_all(&text, "");
    let text = ARTICLE_TAG_REGEX.replace_all(&text, "");
    let text = PARAGRAPH_OPEN_REGEX.replace_all(&text, "\n");
    let text = PARAGRAPH_CLOSE_REGEX.replace_all(&text, "\n");
    let text = ANY_TAG_REGEX.replace_all(&text, "");
    let text = ESCAPED_ANGLE_REGEX.replace_all(&text, "");

    let title = title.trim();

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .skip_while(|line| !title.is_empty() && *line == title)
        .map(|line| format!("{}{}", INDENT, line))
        .collect::<Vec<_>>()
        .join("\n")
}

impl FanqieClient {
    /// Downloads and cleans one chapter.
    ///
    /// Failed attempts are retried with linear backoff (1s, 2s, ...) up to
    /// `request.max_retries` attempts in total.
    pub async fn down_text(&self, chapter_id: &str) -> Result<String, ScraperError> {
        let max_retries = self.config.request.max_retries;
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < max_retries {
            match self.fetch_content(chapter_id).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(
                        chapter_id,
                        attempt,
                        max_retries,
                        error = %e,
                        "Chapter download failed"
                    );
                    last_error = Some(e.to_string());
                    if attempt < max_retries {
                        tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                    }
                }
            }
        }

        Err(ScraperError::Connectivity(format!(
            "could not download chapter {} after {} attempts, the content API may be unavailable: {}",
            chapter_id,
            attempt,
            last_error.as_deref().unwrap_or("no attempts made")
        )))
    }

    /// One download attempt. Empty content counts as a failure.
    async fn fetch_content(&self, chapter_id: &str) -> Result<String, ScraperError> {
        let mut headers = HeaderMap::new();
        if let Ok(user_agent) =
            HeaderValue::from_str(random_user_agent(&self.config.request.user_agents))
        {
            headers.insert(USER_AGENT, user_agent);
        }

        let url = self.config.endpoints.content_url(chapter_id);
        let request = HttpRequest::get(url, self.config.request.timeout()).with_headers(headers);
        let response = self.transport.get(request).await?;

        let payload: ContentResponse = serde_json::from_str(&response.body).map_err(|e| {
            let kind = match e.classify() {
                serde_json::error::Category::Data => "an unexpected",
                _ => "a non-JSON",
            };
            ScraperError::DataShape(format!(
                "content API returned HTTP {} with {} body: {}",
                response.status, kind, e
            ))
        })?;

        if payload.code != Some(200) {
            return Err(ScraperError::DataShape(format!(
                "content API returned code {:?}",
                payload.code
            )));
        }

        let data = payload
            .data
            .ok_or_else(|| ScraperError::DataShape("content API response missing data".to_string()))?;
        let raw = data
            .content
            .ok_or_else(|| ScraperError::DataShape("content API response missing content".to_string()))?;

        let content = clean_content(&raw, data.title.as_deref().unwrap_or(""));
        if content.is_empty() {
            return Err(ScraperError::DataShape(format!(
                "chapter {} has empty content",
                chapter_id
            )));
        }

        Ok(content)
    }
}
