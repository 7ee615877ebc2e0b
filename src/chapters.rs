//! Chapter list extraction and title normalization.

use crate::client::FanqieClient;
use crate::error::ScraperError;
use crate::resolver::BookId;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Side stories and other extra sections keep their
/// own titles and don't get a chapter number.
static SPECIAL_SECTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(番外|特别篇|if线)\s*").unwrap());

/// Scraped "第X章" prefix; the site's own numbering is unreliable.
static CHAPTER_PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^第[一二三四五六七八九十百千万零〇两\d]+章\s*").unwrap()
});

/// One entry of a book's chapter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRecord {
    /// Chapter id, the last segment of the chapter link.
    pub id: String,
    /// Display title, renumbered from position.
    pub title: String,
    /// Absolute chapter page URL.
    pub url: String,
    /// Zero-based position in the site's list.
    pub index: usize,
}

/// CSS selectors used for parsing.
struct Selectors {
    chapter_item: Selector,
    link: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    chapter_item: Selector::parse("div.chapter-item").unwrap(),
    link: Selector::parse("a").unwrap(),
});

/// Renumbers a scraped title as `第{index+1}章 …`.
///
/// Special sections are returned unchanged.
pub fn normalize_chapter_title(raw_title: &str, index: usize) -> String {
    if SPECIAL_SECTION_REGEX.is_match(raw_title) {
        return raw_title.to_string();
    }

    let stripped = CHAPTER_PREFIX_REGEX.replace(raw_title, "");
    format!("第{}章 {}", index + 1, stripped.trim())
}

/// Parses the chapter list HTML.
///
/// Items without a usable link are skipped but still count towards the
/// position of later items.
pub fn parse_chapter_list(html: &str, site_base_url: &str) -> Vec<ChapterRecord> {
    let doc = Html::parse_document(html);

    doc.select(&SELECTORS.chapter_item)
        .enumerate()
        .filter_map(|(index, item)| {
            let Some(link) = item.select(&SELECTORS.link).next() else {
                tracing::debug!(index, "Skipping chapter item without link");
                return None;
            };
            let Some(href) = link.value().attr("href") else {
                tracing::debug!(index, "Skipping chapter link without href");
                return None;
            };

            let raw_title: String = link.text().map(str::trim).collect();
            let id = href
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(href)
                .to_string();

            Some(ChapterRecord {
                id,
                title: normalize_chapter_title(&raw_title, index),
                url: resolve_url(site_base_url, href),
                index,
            })
        })
        .collect()
}

/// Resolves a chapter link against the site base URL.
fn resolve_url(base: &str, relative: &str) -> String {
    if relative.starts_with("http://") || relative.starts_with("https://") {
        return relative.to_string();
    }

    if let Ok(base_url) = url::Url::parse(base)
        && let Ok(resolved) = base_url.join(relative)
    {
        return resolved.to_string();
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

impl FanqieClient {
    /// Fetches the ordered chapter list of a book.
    ///
    /// An empty list is not an error.
    pub async fn extract_chapters(
        &self,
        book_id: &BookId,
    ) -> Result<Vec<ChapterRecord>, ScraperError> {
        let url = self.config.endpoints.chapter_list_url(book_id.as_str());
        let response = self.fetch_page(&url).await?;

        if response.status != 200 {
            tracing::warn!(%book_id, status = response.status, "Chapter list request failed");
        }

        let chapters = parse_chapter_list(&response.body, &self.config.endpoints.site_base_url);
        tracing::debug!(%book_id, count = chapters.len(), "Parsed chapter list");
        Ok(chapters)
    }
}
