//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! list phase, detail pass and output cycle end-to-end over HTTP.

use sumi_harvest::config::{Config, OutputMode, PaginationMode};
use sumi_harvest::crawler::{
    harvest, Coordinator, CrawlOutcome, CrawlStatus, HttpRenderer, StopReason,
};
use sumi_harvest::output::{JsonOutputHandler, OutputHandler};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration for a list rooted at `base_url`
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::for_url(base_url);
    config.crawl.settle_delay_ms = 0;
    config.crawl.politeness_delay_ms = 0;
    config.crawl.navigation_timeout_ms = 5_000;
    config.fields.asset_hosts.clear();
    config
}

fn list_page(ids: &[u32], extra: &str) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li>
                     <div class="storemapdata" data-url="/listing/{id}"></div>
                     <span class="price">${id},000</span>
                     <span class="beds">{id} Beds</span>
                     <a class="seeDetailsDL" href="/listing/{id}/">See details</a>
                   </li>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="dh-property-list"><ul>{}</ul></div>{}</body></html>"#,
        cards, extra
    )
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.into())
        .insert_header("content-type", "text/html")
}

async fn mount_list_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/homes"))
        .and(query_param("pageno", page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, id: u32, description: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/listing/{}", id)))
        .respond_with(html(format!(
            r#"<html><body>
                 <h1>Listing {id}</h1>
                 <div class="property-description">{description}</div>
                 <img src="/media/{id}-a.jpg"><img src="/media/{id}-b.jpg">
                 <ul class="features"><li>Deck</li><li>Shed</li></ul>
               </body></html>"#
        )))
        .mount(server)
        .await;
}

async fn run(config: Config) -> CrawlOutcome {
    let renderer = HttpRenderer::new(&config.user_agent).expect("Failed to build renderer");
    let mut coordinator = Coordinator::new(config, renderer).expect("Failed to build coordinator");
    coordinator.run().await.expect("Harvest failed")
}

#[tokio::test]
async fn test_indexed_parameter_harvest_with_details() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/homes", mock_server.uri());

    mount_list_page(&mock_server, "1", list_page(&[1, 2, 3], "")).await;
    mount_list_page(&mock_server, "2", list_page(&[3, 4, 5], "")).await;
    mount_list_page(
        &mock_server,
        "3",
        r#"<div class="dh-property-list"><p>No more homes.</p></div>"#.to_string(),
    )
    .await;

    for id in [1, 2, 3, 5] {
        mount_detail(&mock_server, id, &format!("Cottage number {}", id)).await;
    }
    Mock::given(method("GET"))
        .and(path("/listing/4"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let outcome = run(create_test_config(&base_url)).await;

    assert_eq!(outcome.status, CrawlStatus::Complete);
    assert_eq!(outcome.stop_reason, StopReason::NoListings);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.count(), 5);

    let ids: Vec<String> = outcome
        .records
        .iter()
        .map(|record| record.id.to_string())
        .collect();
    let expected: Vec<String> = (1..=5)
        .map(|id| format!("{}/listing/{}", mock_server.uri(), id))
        .collect();
    assert_eq!(ids, expected);

    let report = outcome.enrichment.expect("Detail pass should have run");
    assert_eq!(report.attempted, 5);
    assert_eq!(report.enriched, 4);
    assert_eq!(report.failed, 1);
    assert!(!report.aborted);

    let first = &outcome.records[0].fields;
    assert_eq!(first.price.as_deref(), Some("$1,000"));
    assert_eq!(first.bedroom_count, Some(1));
    assert_eq!(first.description.as_deref(), Some("Cottage number 1"));
    assert_eq!(first.images.len(), 2);
    assert_eq!(first.features, vec!["Deck".to_string(), "Shed".to_string()]);

    // The failed detail page leaves the list-page record as it was
    let fourth = &outcome.records[3].fields;
    assert_eq!(fourth.price.as_deref(), Some("$4,000"));
    assert_eq!(fourth.description, None);
}

#[tokio::test]
async fn test_next_control_harvest() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/list/1", mock_server.uri());

    let pages = [
        ("/list/1", list_page(&[1, 2], r#"<a rel="next" href="/list/2">Next</a>"#)),
        ("/list/2", list_page(&[3, 4], r#"<a rel="next" href="/list/3">Next</a>"#)),
        (
            "/list/3",
            list_page(&[5], r#"<a rel="next" class="disabled" href="/list/3">Next</a>"#),
        ),
    ];
    for (page_path, body) in pages {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(html(body))
            .mount(&mock_server)
            .await;
    }

    let mut config = create_test_config(&base_url);
    config.target.pagination = PaginationMode::NextControl;
    config.crawl.enrich_details = false;

    let outcome = run(config).await;

    assert_eq!(outcome.pagination, PaginationMode::NextControl);
    assert_eq!(outcome.stop_reason, StopReason::Exhausted);
    assert_eq!(outcome.pages_visited, 3);
    assert_eq!(outcome.count(), 5);
    assert!(outcome.enrichment.is_none());
}

#[tokio::test]
async fn test_user_agent_sent() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/homes", mock_server.uri());
    let config = create_test_config(&base_url);

    Mock::given(method("GET"))
        .and(path("/homes"))
        .and(query_param("pageno", "1"))
        .and(header("user-agent", config.user_agent.header_value().as_str()))
        .respond_with(html(list_page(&[1], "")))
        .mount(&mock_server)
        .await;

    let mut config = config;
    config.crawl.enrich_details = false;
    let outcome = run(config).await;

    assert_eq!(outcome.count(), 1);
}

#[tokio::test]
async fn test_unreachable_site_writes_undetermined_document() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/homes", mock_server.uri());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let outcome = run(create_test_config(&base_url)).await;
    assert_eq!(outcome.status, CrawlStatus::Undetermined);
    assert_eq!(outcome.stop_reason, StopReason::Unreachable);
    assert_eq!(outcome.count(), 0);

    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("docs").join("listings.json");
    JsonOutputHandler::new(&output_path, OutputMode::Full)
        .write_outcome(&outcome)
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(written["status"], "undetermined");
    assert_eq!(written["count"], 0);
    assert_eq!(written["pagesVisited"], 0);
    assert_eq!(written["listings"], serde_json::json!([]));
}

#[tokio::test]
async fn test_urls_only_output_file() {
    let mock_server = MockServer::start().await;
    let base_url = format!("{}/homes", mock_server.uri());

    mount_list_page(&mock_server, "1", list_page(&[7, 8], "")).await;

    let mut config = create_test_config(&base_url);
    config.output.mode = OutputMode::UrlsOnly;

    let outcome = run(config.clone()).await;
    assert!(outcome.enrichment.is_none());

    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("nested").join("out.json");
    config.output.path = output_path.display().to_string();
    JsonOutputHandler::from_config(&config.output)
        .write_outcome(&outcome)
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(written["source"], base_url.as_str());
    assert_eq!(written["pagination"], "indexed-parameter");
    assert_eq!(written["count"], 2);
    assert_eq!(
        written["listings"],
        serde_json::json!([
            format!("{}/listing/7", mock_server.uri()),
            format!("{}/listing/8", mock_server.uri()),
        ])
    );
}

#[tokio::test]
async fn test_failed_harvest_publishes_undetermined_document() {
    let mut config = create_test_config("https://site.test/homes");
    config.selectors.cards = vec!["[[".to_string()];

    let result = harvest(config.clone()).await;
    assert!(result.is_err());

    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("listings.json");
    JsonOutputHandler::new(&output_path, OutputMode::Full)
        .write_outcome(&CrawlOutcome::undetermined(&config))
        .unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(written["status"], "undetermined");
    assert_eq!(written["stopReason"], "unreachable");
    assert_eq!(written["count"], 0);
    assert_eq!(written["source"], "https://site.test/homes");
    assert_eq!(written["listings"], serde_json::json!([]));
}
