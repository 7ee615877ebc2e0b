//! End-to-end tests against a local HTTP server, going through the real
//! `reqwest` transport.

use fanqie::{BookId, Config, FanqieClient, ScraperError};
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COOKIE: &str = "novel_web_id=1234567890123456789";

const BOOK_PAGE: &str = r#"<html><body>
<h1>十日终焉</h1>
<div class="author-name"><span class="author-name-text">杀虫队队员</span></div>
<div class="page-abstract-content"><p>一觉醒来，他身处陌生的房间。</p></div>
</body></html>"#;

const CHAPTER_LIST: &str = r#"<div>
<div class="chapter-item"><a href="/reader/101">第一章 空屋</a></div>
<div class="chapter-item"><a href="/reader/102">第二章 十人</a></div>
</div>"#;

/// Points every endpoint at `server` and keeps the cookie in `dir`.
fn config_for(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.endpoints.site_base_url = server.uri();
    config.endpoints.chapter_api_base_url = server.uri();
    config.endpoints.content_api_url = format!("{}/api/tomato/content.php", server.uri());
    config.paths.cookie_file = Some(dir.path().join("cookie.json"));
    config.request.request_timeout_sec = 5;
    config
}

fn client_with_cookie(server: &MockServer, dir: &TempDir) -> FanqieClient {
    let config = config_for(server, dir);
    std::fs::write(
        config.paths.cookie_file.as_ref().unwrap(),
        serde_json::to_string(COOKIE).unwrap(),
    )
    .unwrap();
    FanqieClient::new(config).unwrap()
}

#[tokio::test]
async fn cookie_is_minted_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("cookie"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = FanqieClient::new(config_for(&server, &dir)).unwrap();

    let cookie = client.get_cookie().await.unwrap();
    assert!(cookie.starts_with("novel_web_id="));
    assert_eq!(cookie.len(), "novel_web_id=".len() + 19);

    let saved: String =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("cookie.json")).unwrap())
            .unwrap();
    assert_eq!(saved, cookie);

    // Served from the file this time; `expect(1)` checks no second probe.
    assert_eq!(client.get_cookie().await.unwrap(), cookie);
}

#[tokio::test]
async fn cookie_generation_gives_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, &dir);
    config.request.cookie_attempts = 2;
    config.request.cookie_retry_delay_ms = 10;
    let client = FanqieClient::new(config).unwrap();

    let err = client.get_cookie().await.unwrap_err();
    assert!(err.to_string().contains("HTTP 403"));
    assert!(!dir.path().join("cookie.json").exists());
}

#[tokio::test]
async fn book_info_and_chapters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page/7000"))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_string(BOOK_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reading/bookapi/search/7000/v"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHAPTER_LIST))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_with_cookie(&server, &dir);
    let book_id = BookId::new("7000").unwrap();

    let info = client.get_book_info(&book_id).await.unwrap().unwrap();
    assert_eq!(info.name, "十日终焉");
    assert_eq!(info.author, "杀虫队队员");
    assert_eq!(info.description, "一觉醒来，他身处陌生的房间。");

    let chapters = client.extract_chapters(&book_id).await.unwrap();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[1].id, "102");
    assert_eq!(chapters[1].title, "第2章 十人");
    assert_eq!(chapters[1].url, format!("{}/reader/102", server.uri()));
}

#[tokio::test]
async fn missing_book_page_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_with_cookie(&server, &dir);

    let info = client
        .get_book_info(&BookId::new("404").unwrap())
        .await
        .unwrap();
    assert!(info.is_none());
}

#[tokio::test]
async fn resolves_unknown_url_by_fetching_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/share/abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<script>window.__INITIAL_STATE__={"bookId":"7143038691944959011"}</script>"#),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_with_cookie(&server, &dir);

    let id = client
        .book_id_from_any_url(&format!("{}/share/abc", server.uri()))
        .await
        .unwrap();
    assert_eq!(id.as_str(), "7143038691944959011");

    let err = client
        .book_id_from_any_url(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::Resolution(_)));
}

#[tokio::test]
async fn downloads_chapter_content() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "code": 200,
        "data": {
            "title": "第一章 空屋",
            "content": "<article><p idx=\"1\">第一章 空屋</p><p idx=\"2\">屋里没有人。</p></article>"
        }
    });
    Mock::given(method("GET"))
        .and(path("/api/tomato/content.php"))
        .and(query_param("item_id", "101"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_with_cookie(&server, &dir);

    let text = client.down_text("101").await.unwrap();
    assert_eq!(text, "    屋里没有人。");
}

#[tokio::test]
async fn chapter_download_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tomato/content.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"code": 404})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = config_for(&server, &dir);
    config.request.max_retries = 1;
    let client = FanqieClient::new(config).unwrap();

    let err = client.down_text("999").await.unwrap_err();
    assert!(matches!(err, ScraperError::Connectivity(ref msg) if msg.contains("999")));
}
