mod support;

use std::sync::Arc;
use std::time::Duration;

use opal_core::BatchResultKind;
use opal_engine::strategy::{CourtCaseStrategy, NewsArticleStrategy, NewsSite};
use opal_engine::{
    BatchError, FailureKind, FetchSettings, Orchestrator, OrchestratorError, ReqwestFetcher,
};
use pretty_assertions::assert_eq;
use support::{html, TestSink};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

fn news_1819(timeout: Duration) -> Orchestrator {
    opal_logging::initialize_for_tests();
    let settings = FetchSettings {
        request_timeout: timeout,
        ..FetchSettings::default()
    };
    Orchestrator::new(
        Arc::new(ReqwestFetcher::new(settings)),
        Arc::new(NewsArticleStrategy::new(NewsSite::News1819)),
    )
    .with_sink(Arc::new(TestSink::new()))
}

#[tokio::test]
async fn timed_out_article_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article-1"))
        .respond_with(html(
            r#"<html><head><title>Article One</title></head><body><div>teaser</div></body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/article-2"))
        .respond_with(html("<p>late</p>").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let urls = vec![
        format!("{}/article-1", server.uri()),
        format!("{}/article-2", server.uri()),
    ];
    let outcome = news_1819(Duration::from_millis(200))
        .process(&urls)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 1);
    let news = outcome.records.first().and_then(|r| r.as_news()).unwrap();
    assert_eq!(news.url, urls[0]);
    assert_eq!(news.title, "Article One");
    assert_eq!(news.line_count, 0);
    assert!(news.line_content.is_empty());

    assert_eq!(outcome.report.attempted, 2);
    assert_eq!(outcome.report.fetched, [urls[0].clone()]);
    assert_eq!(outcome.report.skipped.len(), 1);
    assert_eq!(outcome.report.skipped[0].error.kind, FailureKind::Timeout);
    assert_eq!(
        outcome.result_kind(),
        BatchResultKind::Completed {
            records: 1,
            skipped_urls: 1,
            extraction_failures: 0,
        }
    );
}

#[tokio::test]
async fn refused_connections_fail_the_batch() {
    // Nothing listens on the discard port.
    let urls = vec![
        "http://127.0.0.1:9/article-1".to_string(),
        "http://127.0.0.1:9/article-2".to_string(),
    ];
    let err = news_1819(Duration::from_secs(2))
        .process(&urls)
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::AllFailed { attempted: 2, .. }));
}

#[tokio::test]
async fn records_serialize_as_json_array_in_input_order() {
    let server = MockServer::start().await;
    for (route, title) in [("/one", "First"), ("/two", "Second")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html(&format!(
                "<html><head><title>{title}</title></head><body><p>{title} body</p></body></html>"
            )))
            .mount(&server)
            .await;
    }
    let urls = vec![
        format!("{}/one", server.uri()),
        format!("{}/two", server.uri()),
    ];

    let json = news_1819(Duration::from_secs(5))
        .with_concurrency(2)
        .process_to_json(&urls)
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let titles: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["First", "Second"]);
    assert_eq!(value[1]["line_content"]["line 1"], "Second body");
}

#[tokio::test]
async fn empty_batch_reports_nothing_to_fetch() {
    let err = news_1819(Duration::from_secs(1))
        .process_to_json(&[])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestratorError::Batch(BatchError::NothingToFetch)
    ));
}

#[tokio::test]
async fn unusable_pages_are_reported_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<html><body>No matching cases</body></html>"))
        .mount(&server)
        .await;

    let orchestrator = Orchestrator::new(
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        Arc::new(CourtCaseStrategy),
    )
    .with_sink(Arc::new(TestSink::new()));
    let urls = vec![format!("{}/results", server.uri())];

    let outcome = orchestrator.process(&urls).await.unwrap();
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.report.extraction_failures.len(), 1);
    assert_eq!(outcome.report.extraction_failures[0].url, urls[0]);
}
