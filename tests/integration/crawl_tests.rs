//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full
//! crawls end-to-end against them, saving pages into temporary directories.

use std::sync::Arc;
use sumi_spider::config::{parse_config, Config};
use sumi_spider::crawler::{CompletionReason, HtmlLinkExtractor, HttpTransport};
use sumi_spider::storage::{prepare_output_dir, FsDocStore};
use sumi_spider::{doc_name, CrawlSession, SpiderError};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast settings so a crawl against a local server takes milliseconds
fn create_test_config(docs_dir: &std::path::Path) -> Config {
    let mut config = parse_config(
        r#"
[crawler]
workers = 2
crawl-delay-ms = 0
idle-backoff-ms = 5

[supervisor]
sample-interval-ms = 10
stagnation-rounds = 100

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
"#,
    )
    .expect("test config is valid");
    config.output.docs_dir = docs_dir.to_path_buf();
    config
}

fn create_session(config: Config) -> CrawlSession {
    let transport = HttpTransport::new(&config.http).expect("Failed to build client");
    let storage = FsDocStore::new(&config.output.docs_dir);
    CrawlSession::new(
        config,
        Arc::new(transport),
        Arc::new(storage),
        Arc::new(HtmlLinkExtractor::new()),
    )
    .expect("Failed to create session")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn saved_page(dir: &TempDir, url: &str) -> Option<String> {
    let name = doc_name(&url::Url::parse(url).unwrap());
    std::fs::read_to_string(dir.path().join(name)).ok()
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        format!(
            r#"<html><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="https://external.example/">External</a>
            </body></html>"#,
            base
        ),
    )
    .await;
    mount_page(&server, "/page1", r#"<a href="/">Home</a>"#.to_string()).await;
    mount_page(&server, "/page2", r#"<a href="page1">Sibling</a>"#.to_string()).await;

    let docs = TempDir::new().unwrap();
    let mut session = create_session(create_test_config(docs.path()));
    assert_eq!(session.seed([format!("{}/", base)]).await, 1);

    let report = session.run().await.expect("crawl should succeed");

    assert_eq!(report.reason, CompletionReason::Drained);
    assert_eq!(report.queued, 3);
    assert_eq!(report.visited, 3);
    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.stats.links_not_whitelisted, 1);

    assert!(saved_page(&docs, &format!("{}/", base)).unwrap().contains("Page 1"));
    assert!(saved_page(&docs, &format!("{}/page1", base)).is_some());
    assert!(saved_page(&docs, &format!("{}/page2", base)).is_some());
}

#[tokio::test]
async fn test_crawl_respects_robots_txt() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /\nDisallow: /private"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/public">Public</a><a href="/private">Private</a>"#.to_string(),
    )
    .await;
    mount_page(&server, "/public", "public".to_string()).await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret"))
        .expect(0)
        .mount(&server)
        .await;

    let docs = TempDir::new().unwrap();
    let mut session = create_session(create_test_config(docs.path()));
    session.seed([format!("{}/", base)]).await;

    let report = session.run().await.unwrap();

    assert_eq!(report.visited, 2);
    assert_eq!(report.stats.links_excluded, 1);
    assert!(saved_page(&docs, &format!("{}/private", base)).is_none());
}

#[tokio::test]
async fn test_page_without_links_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", "<html><body>Nothing to see</body></html>".to_string()).await;

    let docs = TempDir::new().unwrap();
    let mut session = create_session(create_test_config(docs.path()));
    session.seed([format!("{}/", base)]).await;

    let report = tokio::time::timeout(std::time::Duration::from_secs(10), session.run())
        .await
        .expect("crawl should not hang")
        .unwrap();

    assert_eq!(report.visited_urls, vec![format!("{}/", base)]);
}

#[tokio::test]
async fn test_full_disallow_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow:/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let docs = TempDir::new().unwrap();
    let mut session = create_session(create_test_config(docs.path()));
    assert_eq!(session.seed([format!("{}/", server.uri())]).await, 0);

    assert!(matches!(session.run().await, Err(SpiderError::EmptyFrontier)));
}

#[tokio::test]
async fn test_quota_limits_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (0..20)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", links).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("leaf"))
        .mount(&server)
        .await;

    let docs = TempDir::new().unwrap();
    let mut config = create_test_config(docs.path());
    config.crawler.per_host_page_quota = 5;
    let mut session = create_session(config);
    session.seed([format!("{}/", base)]).await;

    let report = session.run().await.unwrap();

    assert_eq!(report.queued, 5);
    assert_eq!(report.visited, 5);
    assert_eq!(report.stats.links_quota_exhausted, 16);
}

#[tokio::test]
async fn test_content_filter_and_http_failures() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/report.pdf">PDF</a>
           <a href="/logo.png">Logo</a>
           <a href="/missing">Missing</a>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let docs = TempDir::new().unwrap();
    let mut session = create_session(create_test_config(docs.path()));
    session.seed([format!("{}/", base)]).await;

    let report = session.run().await.unwrap();

    assert_eq!(report.stats.links_filtered, 2);
    assert_eq!(report.stats.http_failures, 1);
    assert_eq!(report.visited, 2);
    assert!(saved_page(&docs, &format!("{}/missing", base)).is_none());
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let docs = TempDir::new().unwrap();
    let mut session = create_session(create_test_config(docs.path()));
    session.seed([format!("{}/", server.uri())]).await;

    let report = session.run().await.unwrap();
    assert_eq!(report.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_prepare_output_dir_clears_old_documents() {
    let docs = TempDir::new().unwrap();
    let stale = docs.path().join("stale.html");
    std::fs::write(&stale, "old").unwrap();

    prepare_output_dir(docs.path(), true).await.unwrap();

    assert!(docs.path().exists());
    assert!(!stale.exists());
}
