//! Integration tests for the collector
//!
//! These tests use wiremock to create mock storefronts and run the full
//! collect cycle end-to-end into a temporary output directory.

use seed_collector::config::{CollectConfig, PagingMode, SubcategoryMode};
use seed_collector::output::RunManifest;
use seed_collector::Coordinator;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
///
/// Throttling and retries are off and sub-category discovery is disabled
/// so each test only fetches the pages it mounts.
fn create_test_config(dir: &TempDir, category_urls: Vec<String>) -> CollectConfig {
    CollectConfig {
        category_urls,
        out_dir: dir.path().to_path_buf(),
        rate_limit_rps: 0.0,
        retry_count: 0,
        timeout_sec: 5,
        subcategory_mode: SubcategoryMode::Off,
        ..CollectConfig::default()
    }
}

/// A list page linking the given Cafe24 product numbers
fn product_page(product_nos: &[u32], next_link: Option<&str>) -> String {
    let items: String = product_nos
        .iter()
        .map(|no| {
            format!(
                r#"<li><a href="/product/detail.html?product_no={no}&cate_no=7">Product {no}</a></li>"#
            )
        })
        .collect();
    let next = next_link
        .map(|href| format!(r#"<a href="{href}" rel="next">Next page</a>"#))
        .unwrap_or_default();

    format!(
        r#"<html><body><ul class="prdList">{items}</ul><div class="paging">{next}</div></body></html>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_numbered_page(server: &MockServer, page_path: &str, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn run(config: CollectConfig) -> RunManifest {
    Coordinator::new(config)
        .expect("coordinator setup")
        .run()
        .await
        .expect("run completes")
}

fn read_jsonl(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .expect("output file exists")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid JSON line"))
        .collect()
}

fn product_ids(records: &[Value]) -> Vec<String> {
    let mut ids: Vec<String> = records
        .iter()
        .map(|r| r["external_product_id"].as_str().unwrap_or_default().to_string())
        .collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_page_param_stops_when_no_new_products() {
    let server = MockServer::start().await;
    let category = format!("{}/category/tops", server.uri());

    mount_numbered_page(&server, "/category/tops", "1", product_page(&[1, 2], None)).await;
    mount_numbered_page(&server, "/category/tops", "2", product_page(&[3], None)).await;
    mount_numbered_page(&server, "/category/tops", "3", product_page(&[3], None)).await;
    mount_numbered_page(&server, "/category/tops", "4", product_page(&[4], None)).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, vec![category.clone()]);
    config.paging_mode = PagingMode::PageParam;

    let manifest = run(config).await;

    assert_eq!(manifest.total_list_pages_fetched, 3);
    assert_eq!(manifest.total_detail_urls, 4);
    assert_eq!(manifest.total_canonical_urls, 3);
    assert_eq!(manifest.failures_count, 0);

    let details = read_jsonl(&manifest.output_paths.detail_urls);
    assert_eq!(product_ids(&details), vec!["1", "2", "3"]);

    let first = &details[0];
    assert_eq!(first["category_url"], category.as_str());
    assert_eq!(first["category_target_url"], category.as_str());
    assert_eq!(first["list_page_url"], format!("{}?page=1", category));
    assert_eq!(first["discovery_method"], "category_list");
    assert_eq!(first["platform_hint"], "cafe24");
    assert_eq!(first["http_status"], 200);
    assert_eq!(first["shop_base_url"], server.uri());
    assert_eq!(first["notes"], serde_json::json!([]));
    assert!(first["canonical_url"]
        .as_str()
        .unwrap()
        .ends_with("/product/detail.html?product_no=1"));
    assert!(first["detail_url"].as_str().unwrap().contains("cate_no=7"));
}

#[tokio::test]
async fn test_next_link_stops_on_cycle() {
    let server = MockServer::start().await;
    mount_page(&server, "/list/a", product_page(&[1], Some("/list/b"))).await;
    mount_page(&server, "/list/b", product_page(&[2], Some("/list/a"))).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, vec![format!("{}/list/a", server.uri())]);
    config.paging_mode = PagingMode::NextLink;

    let manifest = run(config).await;

    assert_eq!(manifest.total_list_pages_fetched, 2);
    assert_eq!(manifest.total_canonical_urls, 2);
    assert_eq!(manifest.failures_count, 0);
}

#[tokio::test]
async fn test_auto_falls_back_to_next_link() {
    let server = MockServer::start().await;
    let empty_first_page = r#"<html><body><p>Loading</p><a href="/category/shoes/p2">다음</a></body></html>"#;
    mount_page(&server, "/category/shoes", empty_first_page.to_string()).await;
    mount_page(&server, "/category/shoes/p2", product_page(&[5, 6], None)).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{}/category/shoes", server.uri())]);

    let manifest = run(config).await;

    assert_eq!(manifest.total_list_pages_fetched, 2);
    assert_eq!(manifest.total_canonical_urls, 2);
    assert_eq!(manifest.failures_count, 1);

    let failures = read_jsonl(&manifest.output_paths.seed_failures);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["failure_category"], "PRODUCT_URLS_NOT_FOUND");
    assert_eq!(failures[0]["message"], "No product detail links found");
    assert_eq!(failures[0]["status_code"], 200);

    let details = read_jsonl(&manifest.output_paths.detail_urls);
    assert_eq!(product_ids(&details), vec!["5", "6"]);
    assert!(details
        .iter()
        .all(|d| d["list_page_url"] == format!("{}/category/shoes/p2", server.uri()).as_str()));
}

#[tokio::test]
async fn test_auto_continues_with_page_param() {
    let server = MockServer::start().await;
    mount_numbered_page(&server, "/category/bags", "1", product_page(&[1], None)).await;
    mount_numbered_page(&server, "/category/bags", "2", product_page(&[2], None)).await;
    Mock::given(method("GET"))
        .and(path("/category/bags"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, vec![format!("{}/category/bags", server.uri())]);

    let manifest = run(config).await;

    assert_eq!(manifest.total_list_pages_fetched, 3);
    assert_eq!(manifest.total_canonical_urls, 2);

    let failures = read_jsonl(&manifest.output_paths.seed_failures);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["failure_category"], "FETCH_FAILED");
    assert_eq!(failures[0]["message"], "HTTP 404");
    assert_eq!(failures[0]["status_code"], 404);
}

#[tokio::test]
async fn test_page_cap_limits_each_target() {
    let server = MockServer::start().await;
    for page in 1..=4u32 {
        mount_numbered_page(&server, "/category/hats", &page.to_string(), product_page(&[page], None)).await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, vec![format!("{}/category/hats", server.uri())]);
    config.paging_mode = PagingMode::PageParam;
    config.max_pages_per_category = 2;

    let manifest = run(config).await;

    assert_eq!(manifest.total_list_pages_fetched, 2);
    assert_eq!(manifest.total_canonical_urls, 2);
}

#[tokio::test]
async fn test_blocked_category_does_not_affect_sibling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/category/blocked"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    mount_page(&server, "/category/open", product_page(&[10, 11], None)).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(
        &dir,
        vec![
            format!("{}/category/blocked", server.uri()),
            format!("{}/category/open", server.uri()),
        ],
    );
    config.paging_mode = PagingMode::PageParam;

    let manifest = run(config).await;

    // blocked: one page; open: a page with products, then a repeat of it
    assert_eq!(manifest.total_list_pages_fetched, 3);
    assert_eq!(manifest.total_canonical_urls, 2);
    assert_eq!(manifest.failures_count, 1);

    let failures = read_jsonl(&manifest.output_paths.seed_failures);
    assert_eq!(failures[0]["failure_category"], "HTTP_BLOCKED_403_429");
    assert_eq!(failures[0]["message"], "HTTP 429");
    assert_eq!(failures[0]["status_code"], 429);
    assert_eq!(
        failures[0]["category_url"],
        format!("{}/category/blocked", server.uri()).as_str()
    );
}

#[tokio::test]
async fn test_robots_disallow_skips_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /category/"))
        .mount(&server)
        .await;
    mount_page(&server, "/category/private", product_page(&[1], None)).await;

    let dir = TempDir::new().unwrap();
    let category = format!("{}/category/private", server.uri());
    let config = create_test_config(&dir, vec![category.clone()]);

    let manifest = run(config).await;

    assert_eq!(manifest.total_list_pages_fetched, 0);
    assert_eq!(manifest.total_detail_urls, 0);
    assert_eq!(manifest.failures_count, 1);

    let failures = read_jsonl(&manifest.output_paths.seed_failures);
    assert_eq!(failures[0]["failure_category"], "ROBOTS_DISALLOW");
    assert_eq!(failures[0]["message"], "Robots.txt disallows crawling");
    assert_eq!(failures[0]["list_page_url"], category.as_str());
    assert!(failures[0]["status_code"].is_null());
}

#[tokio::test]
async fn test_product_cap_stops_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/category/all", product_page(&[1, 2, 3, 4, 5], None)).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, vec![format!("{}/category/all", server.uri())]);
    config.paging_mode = PagingMode::PageParam;
    config.max_products = 3;

    let manifest = run(config).await;

    assert_eq!(manifest.total_list_pages_fetched, 1);
    assert_eq!(manifest.total_canonical_urls, 3);

    let details = read_jsonl(&manifest.output_paths.detail_urls);
    assert_eq!(product_ids(&details), vec!["1", "2", "3"]);
}

#[tokio::test]
async fn test_subcategory_discovery_labels_records() {
    let server = MockServer::start().await;
    let landing = r#"<html><body>
        <div class="location"><a href="/">Home</a> &gt; <a href="/category/women">Women</a></div>
        <ul class="menuCategory">
            <li><a href="/category/women/tops">Tops</a></li>
            <li><a href="/category/women/pants">Pants</a></li>
        </ul>
    </body></html>"#;
    mount_page(&server, "/category/women", landing.to_string()).await;
    mount_page(&server, "/category/women/tops", product_page(&[1], None)).await;
    mount_page(&server, "/category/women/pants", product_page(&[2], None)).await;

    let dir = TempDir::new().unwrap();
    let input = format!("{}/category/women", server.uri());
    let mut config = create_test_config(&dir, vec![input.clone()]);
    config.subcategory_mode = SubcategoryMode::Auto;
    config.paging_mode = PagingMode::NextLink;

    let manifest = run(config).await;

    // the discovery fetch is not a list page
    assert_eq!(manifest.total_list_pages_fetched, 2);
    assert_eq!(manifest.total_canonical_urls, 2);

    let mut details = read_jsonl(&manifest.output_paths.detail_urls);
    details.sort_by_key(|d| d["external_product_id"].as_str().unwrap_or_default().to_string());

    assert_eq!(details[0]["category_url"], input.as_str());
    assert_eq!(
        details[0]["category_target_url"],
        format!("{}/category/women/tops", server.uri()).as_str()
    );
    assert_eq!(details[0]["category_path"], serde_json::json!(["Women", "Tops"]));
    assert_eq!(details[0]["category_leaf"], "Tops");
    assert_eq!(details[1]["category_path"], serde_json::json!(["Women", "Pants"]));
    assert_eq!(details[1]["category_leaf"], "Pants");
}

#[tokio::test]
async fn test_retry_after_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/category/busy"))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after", "0.1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/category/busy", product_page(&[8], None)).await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, vec![format!("{}/category/busy", server.uri())]);
    config.paging_mode = PagingMode::NextLink;
    config.retry_count = 1;

    let manifest = run(config).await;

    assert_eq!(manifest.total_list_pages_fetched, 1);
    assert_eq!(manifest.total_canonical_urls, 1);
    assert_eq!(manifest.failures_count, 0);
}

#[tokio::test]
async fn test_manifest_written_and_outputs_truncated() {
    let server = MockServer::start().await;
    mount_page(&server, "/category/one", product_page(&[1], None)).await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("detail_urls.jsonl"), "stale line\n").unwrap();

    let mut config = create_test_config(&dir, vec![format!("{}/category/one", server.uri())]);
    config.paging_mode = PagingMode::NextLink;

    let manifest = run(config).await;

    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest.output_paths.seed_manifest).unwrap()).unwrap();
    assert_eq!(written["seed_run_id"], manifest.seed_run_id.as_str());
    assert_eq!(written["total_canonical_urls"], 1);
    assert_eq!(written["config_hash"].as_str().unwrap().len(), 64);
    assert_eq!(written["input_category_urls"].as_array().unwrap().len(), 1);

    assert_eq!(read_jsonl(&manifest.output_paths.detail_urls).len(), 1);
}
