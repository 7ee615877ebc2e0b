//! Book metadata from the landing page.

use crate::client::FanqieClient;
use crate::error::ScraperError;
use crate::resolver::BookId;
use scraper::{Html, Selector};
use std::sync::LazyLock;

const UNKNOWN_TITLE: &str = "未知书名";
const UNKNOWN_AUTHOR: &str = "未知作者";
const NO_DESCRIPTION: &str = "无简介";

/// Title, author and synopsis of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInfo {
    pub name: String,
    pub author: String,
    pub description: String,
}

/// CSS selectors used for parsing.
struct Selectors {
    title: Selector,
    author: Selector,
    description: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    title: Selector::parse("h1").unwrap(),
    author: Selector::parse("div.author-name span.author-name-text").unwrap(),
    description: Selector::parse("div.page-abstract-content p").unwrap(),
});

/// Extracts book info from landing page HTML, with placeholders for
/// anything missing.
pub fn parse_book_info(html: &str) -> BookInfo {
    let doc = Html::parse_document(html);
    let first_text = |selector: &Selector, fallback: &str| {
        doc.select(selector)
            .next()
            .map(|elem| elem.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| fallback.to_string())
    };

    BookInfo {
        name: first_text(&SELECTORS.title, UNKNOWN_TITLE),
        author: first_text(&SELECTORS.author, UNKNOWN_AUTHOR),
        description: first_text(&SELECTORS.description, NO_DESCRIPTION),
    }
}

impl FanqieClient {
    /// Fetches the book's landing page.
    ///
    /// Returns `Ok(None)` when the page does not answer with HTTP 200.
    pub async fn get_book_info(&self, book_id: &BookId) -> Result<Option<BookInfo>, ScraperError> {
        let url = self.config.endpoints.book_page_url(book_id.as_str());
        let response = self.fetch_page(&url).await?;

        if response.status != 200 {
            tracing::warn!(%book_id, status = response.status, "Book page request failed");
            return Ok(None);
        }

        Ok(Some(parse_book_info(&response.body)))
    }
}
