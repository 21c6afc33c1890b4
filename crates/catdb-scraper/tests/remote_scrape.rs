//! Integration tests for `RemoteScrapeAdapter` against a mocked crawl service.

use std::time::Duration;

use catdb_core::{Brand, SourceConfig, SourceKind};
use catdb_scraper::sources::RemoteScrapeAdapter;
use catdb_scraper::{ProductSource, RemoteScrapeProxy, ScraperError, ScraperSettings};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn settings(server: &MockServer) -> ScraperSettings {
    ScraperSettings {
        max_retries: 0,
        backoff_base_secs: 0,
        request_timeout_secs: 5,
        remote_api_url: server.uri(),
        remote_api_token: Some(TOKEN.to_string()),
        remote_poll_interval: Duration::from_millis(20),
        ..ScraperSettings::default()
    }
}

fn adapter(server: &MockServer, max_wait: Duration) -> RemoteScrapeAdapter {
    let proxy = RemoteScrapeProxy::new(&settings(server)).expect("failed to build proxy");
    RemoteScrapeAdapter::new(proxy, max_wait)
}

fn brand(config: SourceConfig) -> Brand {
    Brand {
        id: 2,
        slug: "lumen-atelier".to_string(),
        name: "Lumen Atelier".to_string(),
        storefront_url: "https://lumen-atelier.example".to_string(),
        source_kind: Some(SourceKind::RemoteScrape),
        source_config: config,
        active: true,
        last_synced_at: None,
    }
}

fn crawl_config() -> SourceConfig {
    SourceConfig {
        job_id: Some("acme~store-crawler".to_string()),
        listing_urls: vec!["https://lumen-atelier.example/shop".to_string()],
        max_items: Some(500),
        ..SourceConfig::default()
    }
}

fn job(status: &str) -> Value {
    json!({"data": {"id": "run-1", "status": status, "defaultDatasetId": "ds-1"}})
}

fn rows(n: usize) -> Value {
    Value::Array(
        (0..n)
            .map(|i| {
                json!({
                    "name": format!("Silk Blouse {i}"),
                    "url": format!("https://lumen-atelier.example/p/blouse-{i}"),
                    "offers": {"price": "120.00", "priceCurrency": "USD"}
                })
            })
            .collect(),
    )
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(body_partial_json(json!({
            "jobId": "acme~store-crawler",
            "input": {
                "startUrls": [{"url": "https://lumen-atelier.example/shop"}],
                "maxItems": 500
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(job("READY")))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_results(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/results/ds-1"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn submits_polls_and_fetches_results() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/jobs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("RUNNING")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("SUCCEEDED")))
        .mount(&server)
        .await;
    mount_results(&server, rows(3)).await;

    let outcome = adapter(&server, Duration::from_secs(5))
        .fetch_all(&brand(crawl_config()), None)
        .await
        .expect("remote crawl should succeed");

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.dataset_id.as_deref(), Some("ds-1"));
    assert!(outcome.degraded.is_none());
}

#[tokio::test]
async fn failed_job_with_rows_is_degraded_not_fatal() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/jobs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("FAILED")))
        .mount(&server)
        .await;
    mount_results(&server, json!({"items": rows(2)})).await;

    let outcome = adapter(&server, Duration::from_secs(5))
        .fetch_all(&brand(crawl_config()), None)
        .await
        .expect("partial rows should be imported");

    assert_eq!(outcome.records.len(), 2);
    let note = outcome.degraded.expect("outcome should be marked degraded");
    assert!(note.contains("FAILED"), "{note}");
}

#[tokio::test]
async fn failed_job_without_rows_is_an_error() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/jobs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("ABORTED")))
        .mount(&server)
        .await;
    mount_results(&server, json!([])).await;

    let err = adapter(&server, Duration::from_secs(5))
        .fetch_all(&brand(crawl_config()), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, ScraperError::RemoteJobFailed { ref run_id, ref state } if run_id == "run-1" && state == "ABORTED"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn job_that_never_finishes_times_out() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/jobs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("RUNNING")))
        .mount(&server)
        .await;

    let err = adapter(&server, Duration::from_millis(150))
        .fetch_all(&brand(crawl_config()), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, ScraperError::Timeout { ref run_id, .. } if run_id == "run-1"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn slow_status_request_cannot_outlast_max_wait() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/jobs/run-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(job("SUCCEEDED"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let err = adapter(&server, Duration::from_millis(150))
        .fetch_all(&brand(crawl_config()), None)
        .await
        .unwrap_err();

    assert!(
        started.elapsed() < Duration::from_secs(2),
        "waited {:?}",
        started.elapsed()
    );
    assert!(
        matches!(err, ScraperError::Timeout { ref run_id, .. } if run_id == "run-1"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn known_dataset_is_reimported_without_a_new_job() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(job("READY")))
        .expect(0)
        .mount(&server)
        .await;
    mount_results(&server, json!({"data": {"items": rows(4)}})).await;

    let config = SourceConfig {
        dataset_id: Some("ds-1".to_string()),
        ..SourceConfig::default()
    };
    let outcome = adapter(&server, Duration::from_secs(5))
        .fetch_all(&brand(config), None)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 4);
    assert_eq!(outcome.dataset_id.as_deref(), Some("ds-1"));
}

#[tokio::test]
async fn existing_run_is_polled_without_submitting() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(job("READY")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job("SUCCEEDED")))
        .mount(&server)
        .await;
    mount_results(&server, rows(1)).await;

    let config = SourceConfig {
        run_id: Some("run-1".to_string()),
        ..SourceConfig::default()
    };
    let outcome = adapter(&server, Duration::from_secs(5))
        .fetch_all(&brand(config), None)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
}

#[tokio::test]
async fn missing_job_id_is_a_configuration_error() {
    let server = MockServer::start().await;

    let err = adapter(&server, Duration::from_secs(1))
        .fetch_all(&brand(SourceConfig::default()), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScraperError::MissingSourceConfig { field: "job_id", .. }
    ));
}

#[tokio::test]
async fn service_error_surfaces_status_and_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let err = adapter(&server, Duration::from_secs(1))
        .fetch_all(&brand(crawl_config()), None)
        .await
        .unwrap_err();

    match err {
        ScraperError::RemoteApi { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "invalid token");
        }
        other => panic!("expected RemoteApi, got {other:?}"),
    }
}
