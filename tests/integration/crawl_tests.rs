//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, including interrupt and resume.

use scope_crawl::config::Config;
use scope_crawl::crawler::{Coordinator, CrawlOutcome};
use scope_crawl::state::{ErrorCode, UrlRecord};
use scope_crawl::storage::{bootstrap, encode_records, read_records, write_records};
use scope_crawl::url::ScopePolicy;
use scope_crawl::CrawlError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrent_fetches = 4;
    config.crawler.request_timeout_secs = 5;
    config.crawler.connect_timeout_secs = 2;
    config.output.output_path = dir.path().join("output.json").display().to_string();
    config.output.checkpoint_path = dir.path().join("working.json").display().to_string();
    config
}

fn html_page(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

fn links_page(links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">link</a>"#, l))
        .collect();
    html_page(format!("<html><body>{}</body></html>", anchors))
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_page_expect(
    server: &MockServer,
    route: &str,
    response: ResponseTemplate,
    hits: u64,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(hits)
        .mount(server)
        .await;
}

/// Runs a fresh crawl to completion and returns the written output records
async fn crawl_to_completion(config: &Config, seed: &str) -> Vec<UrlRecord> {
    let start = bootstrap(Path::new(&config.output.checkpoint_path), Some(seed), false)
        .expect("Failed to bootstrap");
    let coordinator = Coordinator::new(config, start).expect("Failed to create coordinator");

    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        coordinator.run(std::future::pending()),
    )
    .await
    .expect("Crawl did not reach quiescence")
    .expect("Crawl failed");

    let records = read_records(Path::new(&config.output.output_path))
        .expect("Failed to read output")
        .expect("Output file missing");

    assert_eq!(outcome, CrawlOutcome::Completed { records: records.len() });
    records
}

fn find<'a>(records: &'a [UrlRecord], address: &str) -> &'a UrlRecord {
    records
        .iter()
        .find(|r| r.address == address)
        .unwrap_or_else(|| panic!("no record for {}", address))
}

#[tokio::test]
async fn test_scope_records_everything_but_crawls_only_children() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/a", base);

    mount_page(
        &mock_server,
        "/a",
        links_page(&[
            "/a/b".to_string(),
            "http://other.test/x".to_string(),
            String::new(),
        ]),
    )
    .await;
    mount_page_expect(&mock_server, "/a/b", html_page("<html></html>"), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let records = crawl_to_completion(&config, &seed).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].address, seed);
    assert_eq!(records[1].address, format!("{}/a/b", base));
    assert_eq!(
        records[0].discovered_links,
        vec![format!("{}/a/b", base), "http://other.test/x".to_string()]
    );
    assert!(records.iter().all(|r| r.completed));
    assert!(records.iter().all(|r| r.error_code == ErrorCode::None));
    assert!(!Path::new(&config.output.checkpoint_path).exists());
}

#[tokio::test]
async fn test_not_found_is_recorded_as_bad_status() {
    let mock_server = MockServer::start().await;
    let seed = format!("{}/missing", mock_server.uri());
    mount_page(&mock_server, "/missing", ResponseTemplate::new(404)).await;

    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), &seed).await;

    assert_eq!(records.len(), 1);
    assert!(records[0].completed);
    assert_eq!(records[0].error_code, ErrorCode::NonHttpOkStatus);
    assert!(records[0].discovered_links.is_empty());
}

#[tokio::test]
async fn test_non_html_content_is_not_parsed() {
    let mock_server = MockServer::start().await;
    let seed = format!("{}/data", mock_server.uri());
    mount_page(
        &mock_server,
        "/data",
        ResponseTemplate::new(200)
            .set_body_raw(r#"{"href": "<a href='/data/x'>x</a>"}"#, "application/json"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), &seed).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_code, ErrorCode::NonHtmlContentType);
    assert!(records[0].discovered_links.is_empty());
}

#[tokio::test]
async fn test_undecodable_body_is_parse_error() {
    let mock_server = MockServer::start().await;
    let seed = format!("{}/bin", mock_server.uri());
    mount_page(
        &mock_server,
        "/bin",
        ResponseTemplate::new(200).set_body_raw(b"<p>\xc3\x28</p>".to_vec(), "text/html"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), &seed).await;

    assert_eq!(records[0].error_code, ErrorCode::ParseError);
    assert!(records[0].completed);
}

#[tokio::test]
async fn test_declared_charset_is_used_to_decode() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/a", base);

    let mut body = b"<p>caf\xe9</p>".to_vec();
    body.extend_from_slice(format!(r#"<a href="{}/a/b">b</a>"#, base).as_bytes());
    mount_page(
        &mock_server,
        "/a",
        ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=iso-8859-1"),
    )
    .await;
    mount_page_expect(&mock_server, "/a/b", html_page("<p>b</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), &seed).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].error_code, ErrorCode::None);
    assert_eq!(records[0].discovered_links, vec![format!("{}/a/b", base)]);
    assert_eq!(find(&records, &format!("{}/a/b", base)).error_code, ErrorCode::None);
    mock_server.verify().await;
}

#[tokio::test]
async fn test_oversized_body_is_network_error() {
    let mock_server = MockServer::start().await;
    let seed = format!("{}/big", mock_server.uri());
    mount_page(&mock_server, "/big", html_page("x".repeat(4096))).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.crawler.max_body_bytes = 1024;
    let records = crawl_to_completion(&config, &seed).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_code, ErrorCode::NetworkError);
    assert!(records[0].completed);
}

#[tokio::test]
async fn test_unreachable_seed_is_network_error() {
    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), "http://127.0.0.1:9/a").await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].error_code, ErrorCode::NetworkError);
    assert!(records[0].completed);
}

#[tokio::test]
async fn test_failed_child_does_not_stop_siblings() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/docs", base);

    mount_page(
        &mock_server,
        "/docs",
        links_page(&[
            format!("{}/docs/broken", base),
            format!("{}/docs/ok", base),
        ]),
    )
    .await;
    mount_page(&mock_server, "/docs/broken", ResponseTemplate::new(500)).await;
    mount_page(
        &mock_server,
        "/docs/ok",
        links_page(&[format!("{}/docs/ok/deeper", base)]),
    )
    .await;
    mount_page_expect(&mock_server, "/docs/ok/deeper", html_page("<p>leaf</p>"), 1).await;

    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), &seed).await;

    assert_eq!(records.len(), 4);
    assert_eq!(
        find(&records, &format!("{}/docs/broken", base)).error_code,
        ErrorCode::NonHttpOkStatus
    );
    assert_eq!(
        find(&records, &format!("{}/docs/ok/deeper", base)).error_code,
        ErrorCode::None
    );
}

#[tokio::test]
async fn test_out_of_scope_link_is_never_fetched() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/docs", base);

    mount_page(
        &mock_server,
        "/docs",
        links_page(&[format!("{}/blog", base), format!("{}/docs/intro", base)]),
    )
    .await;
    mount_page_expect(&mock_server, "/blog", html_page(""), 0).await;
    mount_page_expect(&mock_server, "/docs/intro", html_page(""), 1).await;

    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), &seed).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].discovered_links.len(), 2);
    mock_server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_discovery_spawns_once() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/a", base);
    let shared = format!("{}/a/c", base);

    mount_page(
        &mock_server,
        "/a",
        links_page(&[format!("{}/a/1", base), format!("{}/a/2", base)]),
    )
    .await;
    mount_page(&mock_server, "/a/1", links_page(&[shared.clone(), seed.clone()])).await;
    mount_page(&mock_server, "/a/2", links_page(&[shared.clone(), seed.clone()])).await;
    mount_page_expect(&mock_server, "/a/c", links_page(&[format!("{}/a/1", base)]), 1).await;

    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), &seed).await;

    assert_eq!(records.len(), 4);
    assert_eq!(records.iter().filter(|r| r.address == shared).count(), 1);
    assert_eq!(find(&records, &format!("{}/a/1", base)).discovered_links.len(), 2);
    assert_eq!(find(&records, &format!("{}/a/2", base)).discovered_links.len(), 2);
    mock_server.verify().await;
}

#[tokio::test]
async fn test_addresses_are_unique_ignoring_case() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/a", base);

    mount_page(&mock_server, "/a", links_page(&[format!("{}/a/Page", base)])).await;
    let page = links_page(&[format!("{}/A/PAGE", base), format!("{}/a/page", base)]);
    mount_page(&mock_server, "/a/Page", page).await;

    let dir = TempDir::new().unwrap();
    let records = crawl_to_completion(&create_test_config(&dir), &seed).await;

    let unique: HashSet<String> = records.iter().map(|r| r.address.to_lowercase()).collect();
    assert_eq!(unique.len(), records.len());
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_raw_links_without_resolution_are_recorded_only() {
    let mock_server = MockServer::start().await;
    let seed = format!("{}/a", mock_server.uri());

    mount_page(&mock_server, "/a", links_page(&["/a/b".to_string()])).await;
    mount_page_expect(&mock_server, "/a/b", html_page(""), 0).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir);
    config.crawler.resolve_relative_links = false;
    let records = crawl_to_completion(&config, &seed).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].discovered_links, vec!["/a/b".to_string()]);
    mock_server.verify().await;
}

#[tokio::test]
async fn test_scope_policies_differ_on_shared_prefix() {
    for (policy, expected_hits) in [(ScopePolicy::Prefix, 1), (ScopePolicy::PathBoundary, 0)] {
        let mock_server = MockServer::start().await;
        let base = mock_server.uri();
        let seed = format!("{}/foo", base);

        mount_page(
            &mock_server,
            "/foo",
            links_page(&[format!("{}/foo10", base), format!("{}/foo/bar", base)]),
        )
        .await;
        mount_page_expect(&mock_server, "/foo10", html_page(""), expected_hits).await;
        mount_page_expect(&mock_server, "/foo/bar", html_page(""), 1).await;

        let dir = TempDir::new().unwrap();
        let mut config = create_test_config(&dir);
        config.crawler.scope_policy = policy;
        let records = crawl_to_completion(&config, &seed).await;

        assert_eq!(records.len() as u64, 2 + expected_hits, "policy {}", policy);
        mock_server.verify().await;
    }
}

#[tokio::test]
async fn test_output_survives_load_and_save() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/a", base);

    mount_page(
        &mock_server,
        "/a",
        links_page(&[format!("{}/a/b", base), "mailto:me@x.test".to_string()]),
    )
    .await;
    mount_page(&mock_server, "/a/b", ResponseTemplate::new(404)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let records = crawl_to_completion(&config, &seed).await;

    let on_disk = std::fs::read(&config.output.output_path).unwrap();
    assert_eq!(encode_records(&records).unwrap(), on_disk);

    let copy = dir.path().join("copy.json");
    write_records(&copy, &records).unwrap();
    assert_eq!(std::fs::read(&copy).unwrap(), on_disk);
}

#[tokio::test]
async fn test_existing_checkpoint_without_resume_does_nothing() {
    let mock_server = MockServer::start().await;
    let seed = format!("{}/a", mock_server.uri());
    mount_page(&mock_server, "/a", html_page("")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let checkpoint = PathBuf::from(&config.output.checkpoint_path);
    write_records(&checkpoint, &[UrlRecord::new(seed.clone())]).unwrap();
    let before = std::fs::read(&checkpoint).unwrap();

    let result = bootstrap(&checkpoint, Some(&seed), false);

    assert!(matches!(result, Err(CrawlError::CheckpointExists { .. })));
    assert_eq!(std::fs::read(&checkpoint).unwrap(), before);
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_resume_of_partly_recorded_page_lists_each_link_once() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/a", base);
    let b = format!("{}/a/b", base);
    let c = format!("{}/a/c", base);

    mount_page(&mock_server, "/a", links_page(&[b.clone(), c.clone()])).await;
    mount_page_expect(&mock_server, "/a/b", html_page(""), 0).await;
    mount_page_expect(&mock_server, "/a/c", html_page(""), 1).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let checkpoint = PathBuf::from(&config.output.checkpoint_path);

    let mut partial = UrlRecord::new(seed.clone());
    partial.discovered_links = vec![b.clone()];
    let mut child = UrlRecord::new(b.clone());
    child.completed = true;
    write_records(&checkpoint, &[partial, child]).unwrap();

    let start = bootstrap(&checkpoint, None, true).unwrap();
    let outcome = Coordinator::new(&config, start)
        .unwrap()
        .run(std::future::pending())
        .await
        .unwrap();
    assert_eq!(outcome, CrawlOutcome::Completed { records: 3 });

    let records = read_records(Path::new(&config.output.output_path))
        .unwrap()
        .unwrap();
    assert_eq!(records[0].discovered_links, vec![b, c.clone()]);
    assert!(records[0].completed);
    assert!(find(&records, &c).completed);
    mock_server.verify().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interrupt_then_resume_fetches_only_pending() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let seed = format!("{}/a", base);
    let children: Vec<String> = (1..=4).map(|i| format!("{}/a/{}", base, i)).collect();

    mount_page(&mock_server, "/a", links_page(&children)).await;
    mount_page(&mock_server, "/a/1", html_page("<p>one</p>")).await;
    mount_page(&mock_server, "/a/2", html_page("<p>two</p>")).await;
    for slow in ["/a/3", "/a/4"] {
        mount_page(
            &mock_server,
            slow,
            html_page("<p>slow</p>").set_delay(Duration::from_secs(60)),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let checkpoint = PathBuf::from(&config.output.checkpoint_path);

    // First run: interrupt once the fast pages are done
    let start = bootstrap(&checkpoint, Some(&seed), false).unwrap();
    let coordinator = Coordinator::new(&config, start).unwrap();
    let registry = coordinator.registry();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(coordinator.run(async move {
        let _ = stop_rx.await;
    }));

    let mut settled = false;
    for _ in 0..400 {
        if registry.with(|r| r.len() == 5 && r.incomplete_count() == 2) {
            settled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(settled, "fast pages never completed");

    stop_tx.send(()).unwrap();
    let outcome = handle.await.unwrap().unwrap();
    assert_eq!(outcome, CrawlOutcome::Interrupted { records: 5, pending: 2 });

    let saved = read_records(&checkpoint).unwrap().unwrap();
    assert_eq!(saved.len(), 5);
    assert_eq!(saved.iter().filter(|r| r.completed).count(), 3);
    assert_eq!(saved[0].discovered_links, children);
    assert!(!Path::new(&config.output.output_path).exists());

    // Second run: only the two pending pages may be requested
    mock_server.reset().await;
    for done in ["/a", "/a/1", "/a/2"] {
        mount_page_expect(&mock_server, done, html_page(""), 0).await;
    }
    for pending in ["/a/3", "/a/4"] {
        mount_page_expect(&mock_server, pending, html_page("<p>now fast</p>"), 1).await;
    }

    let start = bootstrap(&checkpoint, None, true).unwrap();
    assert!(start.resumed);
    assert_eq!(start.seed, seed);

    let outcome = Coordinator::new(&config, start)
        .unwrap()
        .run(std::future::pending())
        .await
        .unwrap();
    assert_eq!(outcome, CrawlOutcome::Completed { records: 5 });

    let finished = read_records(Path::new(&config.output.output_path))
        .unwrap()
        .unwrap();
    assert_eq!(finished.len(), 5);
    assert!(finished.iter().all(|r| r.completed));
    assert!(!checkpoint.exists());
    mock_server.verify().await;
}
