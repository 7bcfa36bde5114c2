//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! listing -> product page -> CSV cycle end-to-end.

use listing_harvester::config::{load_config, Config, FetchConfig};
use listing_harvester::crawler::{run_crawl, FetchError, FetchOutcome, Fetcher, HttpFetcher};
use listing_harvester::output::CrawlSummary;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a config file pointing at the mock server and loads it back
fn create_test_config(dir: &TempDir, seed: &str, extra: &str) -> Config {
    let csv_path = dir.path().join("out").join("products.csv");
    let content = format!(
        r#"
[crawl]
seed-url = "{seed}"
max-pages = 5
max-products = 50
workers = 2

[fetch]
user-agent = "test-harvester/1.0"
timeout-ms = 2000

[retry]
base-delay-ms = 10
max-jitter-ms = 0
max-retries = 3

[rate-limit]
min-interval-ms = 5

[output]
csv-path = "{csv}"
{extra}
"#,
        seed = seed,
        csv = csv_path.display().to_string().replace('\\', "/"),
        extra = extra,
    );

    let config_path = dir.path().join("harvest.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    load_config(&config_path).expect("Failed to load config")
}

fn listing_page(links: &[&str], next: bool) -> String {
    let mut body = String::from("<html><head><title>Results</title></head><body><ul>");
    for link in links {
        body.push_str(&format!(
            r#"<li><a class="product-link" href="{}">Product</a></li>"#,
            link
        ));
    }
    body.push_str("</ul>");
    if next {
        body.push_str(r#"<a rel="next" href="?page=next">Next</a>"#);
    }
    body.push_str("</body></html>");
    body
}

fn product_page(title: &str, asin: &str, manufacturer: &str) -> String {
    format!(
        r#"<html><head>
        <title>{title}</title>
        <meta name="description" content="About {title}">
        </head><body>
        <table>
          <tr><th>ASIN</th><td>{asin}</td></tr>
          <tr><th>Manufacturer</th><td>{manufacturer}</td></tr>
        </table>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV");
    let headers = reader
        .headers()
        .expect("Failed to read header")
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.expect("Bad CSV row").iter().map(str::to_string).collect())
        .collect();
    rows.sort();
    (headers, rows)
}

async fn crawl(config: &Config) -> CrawlSummary {
    run_crawl(config, CancellationToken::new())
        .await
        .expect("Crawl failed")
}

#[tokio::test]
async fn test_full_crawl_writes_csv() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &format!("{}/s?k=bags&page=1", base), "");

    mount_listing(&server, 1, listing_page(&["/dp/1", "/dp/2"], true)).await;
    mount_listing(&server, 2, listing_page(&["/dp/3", "/dp/1"], false)).await;
    mount_html(&server, "/dp/1", product_page("Canvas Tote", "B0001", "Acme")).await;
    mount_html(&server, "/dp/2", product_page("Leather Satchel", "B0002", "Acme, Inc.")).await;
    mount_html(&server, "/dp/3", product_page("Duffel", "B0003", "Roam")).await;

    let summary = crawl(&config).await;

    assert_eq!(summary.listing_pages_fetched, 2);
    assert_eq!(summary.detail_pages_fetched, 3);
    assert_eq!(summary.products_emitted, 3);
    assert_eq!(summary.permanent_failures, 0);
    assert!(!summary.cap_reached);

    let (headers, rows) = read_csv(Path::new(&config.output.csv_path));
    assert_eq!(
        headers,
        vec!["Product URL", "Title", "ASIN", "Description", "Manufacturer"]
    );
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        vec![
            format!("{}/dp/1", base),
            "Canvas Tote".to_string(),
            "B0001".to_string(),
            "About Canvas Tote".to_string(),
            "Acme".to_string(),
        ]
    );
    assert_eq!(rows[1][4], "Acme, Inc.");
    assert_eq!(rows[2][1], "Duffel");
}

#[tokio::test]
async fn test_missing_fields_written_as_na() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &format!("{}/s?page=1", server.uri()), "");

    mount_listing(&server, 1, listing_page(&["/dp/bare"], false)).await;
    mount_html(
        &server,
        "/dp/bare",
        "<html><body><p>Nothing here</p></body></html>".to_string(),
    )
    .await;

    let summary = crawl(&config).await;
    assert_eq!(summary.products_emitted, 1);

    let (_, rows) = read_csv(Path::new(&config.output.csv_path));
    assert_eq!(rows[0][1..], ["N/A", "N/A", "N/A", "N/A"]);
}

#[tokio::test]
async fn test_throttled_product_page_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &format!("{}/s?page=1", server.uri()), "");

    mount_listing(&server, 1, listing_page(&["/dp/1"], false)).await;

    // Two 503s, then the page succeeds
    Mock::given(method("GET"))
        .and(path("/dp/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_html(&server, "/dp/1", product_page("Tote", "B0001", "Acme")).await;

    let summary = crawl(&config).await;

    assert_eq!(summary.retries_issued, 2);
    assert_eq!(summary.products_emitted, 1);
    assert_eq!(summary.permanent_failures, 0);
}

#[tokio::test]
async fn test_not_found_product_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &format!("{}/s?page=1", server.uri()), "");

    mount_listing(&server, 1, listing_page(&["/dp/gone", "/dp/2"], false)).await;
    Mock::given(method("GET"))
        .and(path("/dp/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_html(&server, "/dp/2", product_page("Satchel", "B0002", "Acme")).await;

    let summary = crawl(&config).await;

    assert_eq!(summary.permanent_failures, 1);
    assert_eq!(summary.retries_issued, 0);
    assert_eq!(summary.products_emitted, 1);

    let (_, rows) = read_csv(Path::new(&config.output.csv_path));
    assert_eq!(rows.len(), 1);
    assert!(rows[0][0].ends_with("/dp/2"));
}

#[tokio::test]
async fn test_listing_continues_while_products_found() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(
        &dir,
        &format!("{}/s?page=1", server.uri()),
        "\n[extract]\nnext-page-selector = \"\"\n",
    );

    mount_listing(&server, 1, listing_page(&["/dp/1"], false)).await;
    mount_listing(&server, 2, listing_page(&["/dp/2"], false)).await;
    mount_listing(&server, 3, listing_page(&[], false)).await;
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_html(&server, "/dp/1", product_page("One", "B1", "Acme")).await;
    mount_html(&server, "/dp/2", product_page("Two", "B2", "Acme")).await;

    let summary = crawl(&config).await;

    assert_eq!(summary.listing_pages_fetched, 3);
    assert_eq!(summary.products_emitted, 2);
}

#[tokio::test]
async fn test_product_cap_stops_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&dir, &format!("{}/s?page=1", server.uri()), "");
    config.crawl.max_products = 2;
    config.crawl.workers = 1;

    mount_listing(&server, 1, listing_page(&["/dp/1", "/dp/2", "/dp/3"], true)).await;
    mount_html(&server, "/dp/1", product_page("One", "B1", "Acme")).await;
    mount_html(&server, "/dp/2", product_page("Two", "B2", "Acme")).await;
    Mock::given(method("GET"))
        .and(path("/dp/3"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let summary = crawl(&config).await;

    assert!(summary.cap_reached);
    assert_eq!(summary.products_emitted, 2);
    assert_eq!(summary.listing_pages_fetched, 1);
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
        .mount(&server)
        .await;

    let config = FetchConfig {
        timeout_ms: 200,
        ..FetchConfig::default()
    };
    let fetcher = HttpFetcher::new(&config).unwrap();

    let outcome = fetcher.fetch(&format!("{}/slow", server.uri())).await;
    assert_eq!(
        outcome,
        FetchOutcome::RetryableFailure {
            error: FetchError::Timeout
        }
    );
}

#[tokio::test]
async fn test_status_classification_over_http() {
    let server = MockServer::start().await;
    let routes = [
        (429u16, "/throttled"),
        (500, "/broken"),
        (410, "/gone"),
        (403, "/forbidden"),
    ];
    for (status, route) in routes {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
    }

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let url = |route: &str| format!("{}{}", server.uri(), route);

    assert_eq!(
        fetcher.fetch(&url("/throttled")).await,
        FetchOutcome::RetryableFailure {
            error: FetchError::Throttled { status: 429 }
        }
    );
    assert_eq!(
        fetcher.fetch(&url("/broken")).await,
        FetchOutcome::RetryableFailure {
            error: FetchError::Server { status: 500 }
        }
    );
    assert_eq!(
        fetcher.fetch(&url("/gone")).await,
        FetchOutcome::PermanentFailure {
            error: FetchError::NotFound { status: 410 }
        }
    );
    assert_eq!(
        fetcher.fetch(&url("/forbidden")).await,
        FetchOutcome::PermanentFailure {
            error: FetchError::Client { status: 403 }
        }
    );
}

#[tokio::test]
async fn test_user_agent_header_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "test-harvester/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = FetchConfig {
        user_agent: "test-harvester/1.0".to_string(),
        ..FetchConfig::default()
    };
    let fetcher = HttpFetcher::new(&config).unwrap();

    let outcome = fetcher.fetch(&format!("{}/page", server.uri())).await;
    assert!(outcome.is_success());
}
