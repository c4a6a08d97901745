//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock documentation sites and test
//! the full crawl cycle end-to-end against a temporary ledger.

use doc_harvest::config::{
    Config, CrawlerConfig, HttpConfig, LinkConfig, OutputConfig, ProjectConfig,
};
use doc_harvest::crawler::Coordinator;
use doc_harvest::HarvestError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing its ledger into `dir`
fn create_test_config(dir: &TempDir, base_url: &str) -> Config {
    let file = |name: &str| dir.path().join("data").join(name).to_string_lossy().into_owned();

    Config {
        project: ProjectConfig {
            name: "test_docs".to_string(),
            base_url: base_url.to_string(),
        },
        output: OutputConfig {
            records_path: file("records.jsonl"),
            unreachable_path: file("unreachable.jsonl"),
            external_links_path: file("links.jsonl"),
            unextractable_path: Some(file("unextractable.jsonl")),
            log_path: None,
        },
        crawler: CrawlerConfig {
            fetch_timeout_secs: 5,
            retry_delay_ms: 0, // no cooldown in tests
            ..CrawlerConfig::default()
        },
        http: HttpConfig::default(),
        links: LinkConfig::default(),
    }
}

/// A documentation page with enough text to pass the length check
fn doc_page(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">{}</a></li>"#, href, href))
        .collect();

    format!(
        r#"<html><head><title>{title} - Docs</title></head><body>
        <div class="sidebar"><p>Navigation</p></div>
        <div role="main">
            <h1>{title}</h1>
            <p>This page documents {title} in enough detail to pass the minimum
            content length check. It describes configuration, usage and the
            behavior of the subsystem.</p>
            <ul>{anchors}</ul>
        </div>
        </body></html>"#
    )
}

// set_body_string would force text/plain
fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

fn redirect(status: u16, location: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("Location", location)
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Mounts a three-page site below `/docs/`
///
/// `/docs/` links to both pages, an off-base page, an image and a source file
/// on GitHub; page1 links back and to the same GitHub file again.
async fn mount_basic_site(server: &MockServer) {
    mount_page(
        server,
        "/docs/",
        doc_page(
            "Home",
            &[
                "page1.html",
                "page2.html",
                "../outside.html",
                "img/diagram.png",
                "https://github.com/org/repo/blob/main/src/gpio.c",
            ],
        ),
    )
    .await;
    mount_page(
        server,
        "/docs/page1.html",
        doc_page(
            "Page One",
            &[
                "./",
                "page2.html#usage",
                "page2.html",
                "https://github.com/org/repo/blob/main/src/gpio.c",
            ],
        ),
    )
    .await;
    mount_page(server, "/docs/page2.html", doc_page("Page Two", &["page1.html"])).await;
}

fn base_url(server: &MockServer) -> String {
    format!("{}/docs/", server.uri())
}

/// Parses every valid JSON line of a ledger file
fn read_ledger(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

fn urls(records: &[Value]) -> Vec<String> {
    let mut urls: Vec<String> = records
        .iter()
        .map(|r| r["url"].as_str().unwrap().to_string())
        .collect();
    urls.sort();
    urls
}

async fn requests_to(server: &MockServer, page_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == page_path)
        .count()
}

fn ledger_path(config: &Config, which: &str) -> PathBuf {
    PathBuf::from(match which {
        "records" => &config.output.records_path,
        "unreachable" => &config.output.unreachable_path,
        "unextractable" => config.output.unextractable_path.as_ref().unwrap(),
        _ => &config.output.external_links_path,
    })
}

async fn run(config: Config, fresh: bool) -> doc_harvest::CrawlSummary {
    Coordinator::new(config, fresh)
        .await
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed")
}

#[tokio::test]
async fn test_full_crawl_records_every_page() {
    let server = MockServer::start().await;
    mount_basic_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config.clone(), false).await;

    assert_eq!(summary.new_records, 3);
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.unreachable, 0);
    assert_eq!(summary.external_links, 1);
    assert!(!summary.cancelled);

    let records = read_ledger(&ledger_path(&config, "records"));
    let base = server.uri();
    assert_eq!(
        urls(&records),
        vec![
            format!("{}/docs/", base),
            format!("{}/docs/page1.html", base),
            format!("{}/docs/page2.html", base),
        ]
    );

    let page1 = records
        .iter()
        .find(|r| r["id"] == "docs_page1_html")
        .expect("page1 record");
    assert_eq!(page1["title"], "Page One");
    assert_eq!(page1["source"], "test_docs");
    let content = page1["content"].as_str().unwrap();
    assert!(content.starts_with("Page One\nThis page documents Page One"));
    assert!(!content.contains("Navigation"));

    let links = read_ledger(&ledger_path(&config, "links"));
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["url"], "https://github.com/org/repo/blob/main/src/gpio.c");
    assert_eq!(links[0]["file_extension"], ".c");
    assert_eq!(links[0]["source_page"], format!("{}/docs/", base));

    // off-base pages and ignored extensions are never requested
    assert_eq!(requests_to(&server, "/outside.html").await, 0);
    assert_eq!(requests_to(&server, "/docs/img/diagram.png").await, 0);
    // each page is fetched once despite repeated links
    assert_eq!(requests_to(&server, "/docs/page2.html").await, 1);
}

#[tokio::test]
async fn test_worker_pool_matches_sequential_crawl() {
    let server = MockServer::start().await;
    mount_basic_site(&server).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, &base_url(&server));
    config.crawler.workers = 4;
    let summary = run(config.clone(), false).await;

    assert_eq!(summary.new_records, 3);
    assert_eq!(summary.external_links, 1);
    assert_eq!(read_ledger(&ledger_path(&config, "records")).len(), 3);
    assert_eq!(requests_to(&server, "/docs/page1.html").await, 1);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    mount_basic_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));

    let first = run(config.clone(), false).await;
    assert_eq!(first.new_records, 3);
    let unreachable_before = read_ledger(&ledger_path(&config, "unreachable"));

    let second = run(config.clone(), false).await;
    assert_eq!(second.new_records, 0);
    assert_eq!(second.total_records, 3);
    // only the base URL is fetched again
    assert_eq!(second.processed, 1);

    assert_eq!(read_ledger(&ledger_path(&config, "records")).len(), 3);
    assert_eq!(read_ledger(&ledger_path(&config, "links")).len(), 1);
    assert_eq!(
        urls(&read_ledger(&ledger_path(&config, "unreachable"))),
        urls(&unreachable_before)
    );
}

#[tokio::test]
async fn test_fresh_run_revisits_pages_without_duplicating_records() {
    let server = MockServer::start().await;
    mount_basic_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));

    run(config.clone(), false).await;
    let second = run(config.clone(), true).await;

    // every page is fetched again, none is recorded twice
    assert_eq!(second.processed, 3);
    assert_eq!(second.new_records, 0);
    assert_eq!(second.total_records, 3);
    assert_eq!(requests_to(&server, "/docs/page2.html").await, 2);

    let records = read_ledger(&ledger_path(&config, "records"));
    assert_eq!(records.len(), 3);
    assert_eq!(read_ledger(&ledger_path(&config, "links")).len(), 1);
}

#[tokio::test]
async fn test_fresh_run_retries_unreachable_urls() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["flaky.html"])).await;
    Mock::given(method("GET"))
        .and(path("/docs/flaky.html"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    mount_page(&server, "/docs/flaky.html", doc_page("Flaky", &[])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));

    assert_eq!(run(config.clone(), false).await.unreachable, 1);

    let second = run(config.clone(), true).await;
    assert_eq!(second.new_records, 1);
    assert_eq!(second.unreachable, 0);
    assert!(read_ledger(&ledger_path(&config, "unreachable")).is_empty());
    assert_eq!(read_ledger(&ledger_path(&config, "records")).len(), 2);
}

#[tokio::test]
async fn test_transient_failures_respect_retry_bound() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["broken.html"])).await;
    Mock::given(method("GET"))
        .and(path("/docs/broken.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config.clone(), false).await;

    assert_eq!(requests_to(&server, "/docs/broken.html").await, 3);
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.unreachable, 1);

    let unreachable = read_ledger(&ledger_path(&config, "unreachable"));
    assert_eq!(unreachable.len(), 1);
    assert_eq!(unreachable[0]["url"], format!("{}/docs/broken.html", server.uri()));
    assert_eq!(unreachable[0]["reason"], "HTTP 500");

    // records and unreachable URLs are disjoint
    let records = read_ledger(&ledger_path(&config, "records"));
    assert!(!urls(&records).contains(&format!("{}/docs/broken.html", server.uri())));

    // an unreachable URL is not retried by a later run
    run(config.clone(), false).await;
    assert_eq!(requests_to(&server, "/docs/broken.html").await, 3);
}

#[tokio::test]
async fn test_retry_unreachable_option() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["flaky.html"])).await;
    Mock::given(method("GET"))
        .and(path("/docs/flaky.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    mount_page(&server, "/docs/flaky.html", doc_page("Flaky", &[])).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, &base_url(&server));

    let first = run(config.clone(), false).await;
    assert_eq!(first.unreachable, 1);

    config.crawler.retry_unreachable = true;
    let second = run(config.clone(), false).await;
    assert_eq!(second.new_records, 1);
    assert_eq!(second.unreachable, 0);
    assert!(read_ledger(&ledger_path(&config, "unreachable")).is_empty());
}

#[tokio::test]
async fn test_non_html_response_gives_up_immediately() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["manual.html"])).await;
    Mock::given(method("GET"))
        .and(path("/docs/manual.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config.clone(), false).await;

    assert_eq!(requests_to(&server, "/docs/manual.html").await, 1);
    assert_eq!(summary.unreachable, 1);
}

#[tokio::test]
async fn test_robots_disallowed_url_is_never_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /docs/private/"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/docs/",
        doc_page("Home", &["private/secret.html", "public.html"]),
    )
    .await;
    mount_page(&server, "/docs/private/secret.html", doc_page("Secret", &[])).await;
    mount_page(&server, "/docs/public.html", doc_page("Public", &[])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config.clone(), false).await;

    assert_eq!(requests_to(&server, "/docs/private/secret.html").await, 0);
    assert_eq!(summary.new_records, 2);
    assert_eq!(summary.unreachable, 0);
}

#[tokio::test]
async fn test_disallowed_base_url_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));

    let result = Coordinator::new(config, false).await;
    assert!(matches!(result, Err(HarvestError::RobotsDenied { .. })));
}

#[tokio::test]
async fn test_robots_server_error_degrades_to_allow_all() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_basic_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config, false).await;

    assert_eq!(summary.new_records, 3);
}

#[tokio::test]
async fn test_short_page_is_consumed_without_record() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["short.html"])).await;
    mount_page(
        &server,
        "/docs/short.html",
        r#"<html><body><div role="main"><p>Only thirty-seven characters of text.</p></div></body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config.clone(), false).await;

    assert_eq!(requests_to(&server, "/docs/short.html").await, 1);
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.unextractable, 1);
    assert_eq!(summary.unreachable, 0);

    let short = format!("{}/docs/short.html", server.uri());
    assert!(!urls(&read_ledger(&ledger_path(&config, "records"))).contains(&short));
    assert!(read_ledger(&ledger_path(&config, "unreachable")).is_empty());

    let unextractable = read_ledger(&ledger_path(&config, "unextractable"));
    assert_eq!(urls(&unextractable), vec![short]);
    assert!(unextractable[0]["reason"].as_str().unwrap().contains("37"));

    // a later run does not fetch it again
    let second = run(config.clone(), false).await;
    assert_eq!(second.unextractable, 0);
    assert_eq!(requests_to(&server, "/docs/short.html").await, 1);
    assert_eq!(read_ledger(&ledger_path(&config, "unextractable")).len(), 1);
}

#[tokio::test]
async fn test_page_without_content_region_is_unextractable() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["bare.html"])).await;
    mount_page(
        &server,
        "/docs/bare.html",
        "<html><body><span>No recognisable content container</span></body></html>".to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config, false).await;

    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.unextractable, 1);
    assert_eq!(summary.unreachable, 0);
}

#[tokio::test]
async fn test_corrupt_ledger_lines_are_skipped() {
    let server = MockServer::start().await;
    mount_basic_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));

    let records_path = ledger_path(&config, "records");
    std::fs::create_dir_all(records_path.parent().unwrap()).unwrap();
    let prior = format!(
        "{{\"id\": \"docs_page1_html\", \"url\": \"{}/docs/page1.html\", \"title\": \"Page One\", \
         \"content\": \"x\", \"source\": \"test_docs\", \"timestamp\": \"2024-01-01T00:00:00Z\"}}\n\
         {{\"url\": truncated\n\
         this is not json at all\n",
        server.uri()
    );
    std::fs::write(&records_path, prior).unwrap();

    let summary = run(config.clone(), false).await;

    // page1 was already recorded, the garbage lines did not stop the run
    assert_eq!(summary.new_records, 2);
    assert_eq!(summary.total_records, 3);
    assert_eq!(requests_to(&server, "/docs/page1.html").await, 0);

    let records = read_ledger(&records_path);
    assert_eq!(records.len(), 3);
    assert_eq!(
        records
            .iter()
            .filter(|r| r["id"] == "docs_page1_html")
            .count(),
        1
    );
}

#[tokio::test]
async fn test_cancelled_run_writes_snapshot() {
    let server = MockServer::start().await;
    mount_basic_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));

    let coordinator = Coordinator::new(config.clone(), false).await.unwrap();
    coordinator
        .cancel_handle()
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let summary = coordinator.run().await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.processed, 0);
    assert!(ledger_path(&config, "unreachable").exists());
}

#[tokio::test]
async fn test_redirect_target_is_crawled_as_its_own_url() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["old.html"])).await;
    Mock::given(method("GET"))
        .and(path("/docs/old.html"))
        .respond_with(redirect(301, "new.html"))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/new.html", doc_page("New Page", &["old.html"])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config.clone(), false).await;

    assert_eq!(summary.new_records, 2);
    assert_eq!(summary.unreachable, 0);
    assert_eq!(requests_to(&server, "/docs/old.html").await, 1);
    assert_eq!(requests_to(&server, "/docs/new.html").await, 1);

    let records = read_ledger(&ledger_path(&config, "records"));
    let base = server.uri();
    assert_eq!(
        urls(&records),
        vec![format!("{}/docs/", base), format!("{}/docs/new.html", base)]
    );
    let new_page = records.iter().find(|r| r["id"] == "docs_new_html").unwrap();
    assert_eq!(new_page["title"], "New Page");
}

#[tokio::test]
async fn test_redirects_do_not_escape_robots_or_scope() {
    let server = MockServer::start().await;
    mount_robots(&server, "User-agent: *\nDisallow: /docs/private/").await;
    mount_page(
        &server,
        "/docs/",
        doc_page("Home", &["moved.html", "away.html"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/moved.html"))
        .respond_with(redirect(301, "/docs/private/secret.html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/away.html"))
        .respond_with(redirect(302, "/outside/other.html"))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/private/secret.html", doc_page("Secret", &[])).await;
    mount_page(&server, "/outside/other.html", doc_page("Outside", &[])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config.clone(), false).await;

    assert_eq!(requests_to(&server, "/docs/private/secret.html").await, 0);
    assert_eq!(requests_to(&server, "/outside/other.html").await, 0);
    assert_eq!(summary.new_records, 1);

    let base = server.uri();
    let unreachable = read_ledger(&ledger_path(&config, "unreachable"));
    assert_eq!(
        urls(&unreachable),
        vec![format!("{}/docs/away.html", base), format!("{}/docs/moved.html", base)]
    );
    let reason = |url: String| {
        unreachable
            .iter()
            .find(|r| r["url"] == url.as_str())
            .and_then(|r| r["reason"].as_str())
            .unwrap()
            .to_string()
    };
    assert!(reason(format!("{}/docs/moved.html", base)).contains("disallowed by robots.txt"));
    assert!(reason(format!("{}/docs/away.html", base)).contains("out of scope"));
}

#[tokio::test]
async fn test_redirecting_robots_txt_is_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(redirect(301, "/policy/robots.txt"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/policy/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /docs/private/"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/docs/", doc_page("Home", &["private/secret.html"])).await;
    mount_page(&server, "/docs/private/secret.html", doc_page("Secret", &[])).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    run(config, false).await;

    assert_eq!(requests_to(&server, "/docs/private/secret.html").await, 0);
}

#[tokio::test]
async fn test_retry_cooldown_delays_each_attempt() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["broken.html"])).await;
    Mock::given(method("GET"))
        .and(path("/docs/broken.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, &base_url(&server));
    config.crawler.retry_delay_ms = 200;

    let started = Instant::now();
    let summary = run(config, false).await;

    // two cooldowns between three attempts; no cooldown after giving up
    assert!(started.elapsed() >= Duration::from_millis(400));
    assert!(summary.elapsed >= Duration::from_millis(400));
    assert_eq!(requests_to(&server, "/docs/broken.html").await, 3);
    assert_eq!(summary.unreachable, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_retried_url_is_recorded_once_with_many_workers() {
    let server = MockServer::start().await;
    let pages = ["a.html", "b.html", "c.html", "d.html", "e.html"];
    let mut home_links = vec!["flaky.html"];
    home_links.extend(pages);
    mount_page(&server, "/docs/", doc_page("Home", &home_links)).await;
    for page in pages {
        mount_page(
            &server,
            &format!("/docs/{}", page),
            doc_page(page, &["flaky.html", "./"]),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/docs/flaky.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/docs/flaky.html", doc_page("Flaky", &pages)).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, &base_url(&server));
    config.crawler.workers = 4;
    config.crawler.retry_delay_ms = 20;
    let summary = run(config.clone(), false).await;

    assert_eq!(requests_to(&server, "/docs/flaky.html").await, 3);
    assert_eq!(summary.new_records, 7);
    assert_eq!(summary.unreachable, 0);

    let records = read_ledger(&ledger_path(&config, "records"));
    assert_eq!(records.len(), 7);
    let flaky = format!("{}/docs/flaky.html", server.uri());
    assert_eq!(records.iter().filter(|r| r["url"] == flaky.as_str()).count(), 1);
}

#[tokio::test]
async fn test_member_documentation_page_is_recorded() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/", doc_page("Home", &["group__gpio.html"])).await;
    mount_page(
        &server,
        "/docs/group__gpio.html",
        r#"<html><head><title>GPIO Driver APIs</title></head><body>
        <div class="memitem">
            <div class="memproto"><table><tr><td class="memname">int gpio_pin_set(const struct device *port, int pin, int value)</td></tr></table></div>
            <div class="memdoc"><p>Set the logical level of an output pin.</p></div>
        </div>
        <div class="memitem">
            <div class="memproto"><table><tr><td class="memname">int gpio_pin_get(const struct device *port, int pin)</td></tr></table></div>
            <div class="memdoc"><p>Get the logical level of an input pin.</p></div>
        </div>
        </body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    let summary = run(config.clone(), false).await;

    assert_eq!(summary.new_records, 2);
    let records = read_ledger(&ledger_path(&config, "records"));
    let group = records
        .iter()
        .find(|r| r["id"] == "docs_group__gpio_html")
        .expect("member documentation record");
    assert_eq!(group["title"], "GPIO Driver APIs");
    assert_eq!(
        group["content"],
        "int gpio_pin_set(const struct device *port, int pin, int value)\n\
         Set the logical level of an output pin.\n\n---\n\n\
         int gpio_pin_get(const struct device *port, int pin)\n\
         Get the logical level of an input pin."
    );
}

#[tokio::test]
async fn test_source_listing_page_is_filtered() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        doc_page("Home", &["doxygen/html/gpio_8h_source.html"]),
    )
    .await;
    mount_page(
        &server,
        "/docs/doxygen/html/gpio_8h_source.html",
        r#"<html><head><title>gpio.h Source File</title></head><body>
        <div class="contents">
            <div class="line">/* SPDX-License-Identifier: Apache-2.0 */</div>
            <div class="line">Go to the documentation of this file.</div>
            <div class="fragment">
                <div class="line">1 #ifndef ZEPHYR_DRIVERS_GPIO_H_</div>
                <div class="line">2 #define ZEPHYR_DRIVERS_GPIO_H_</div>
                <div class="line">3 int gpio_pin_set(const struct device *port, int pin, int value);</div>
                <div class="line">4 #endif</div>
            </div>
            <div class="memdoc">Definition</div>
            <div class="line">gpio.h:42</div>
        </div>
        </body></html>"#
            .to_string(),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &base_url(&server));
    run(config.clone(), false).await;

    let records = read_ledger(&ledger_path(&config, "records"));
    let listing = records
        .iter()
        .find(|r| r["id"] == "docs_doxygen_html_gpio_8h_source_html")
        .expect("source listing record");
    assert_eq!(listing["title"], "gpio.h Source File");
    assert_eq!(
        listing["content"],
        "#ifndef ZEPHYR_DRIVERS_GPIO_H_\n\
         #define ZEPHYR_DRIVERS_GPIO_H_\n\
         int gpio_pin_set(const struct device *port, int pin, int value);\n\
         #endif"
    );
}
