mod support;

use std::collections::HashMap;
use std::time::Duration;

use opal_engine::{
    fetch_batch, BatchError, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput,
    FetchSettings, Fetcher, JobId, ProgressSink, ReqwestFetcher,
};
use pretty_assertions::assert_eq;
use support::{html, TestSink};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves canned pages after a per-URL delay; unknown URLs fail with 404.
struct ScriptedFetcher {
    pages: HashMap<String, (Duration, String)>,
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _job_id: JobId,
        url: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError> {
        let Some((delay, body)) = self.pages.get(url) else {
            return Err(FetchError::new(FailureKind::HttpStatus(404), "not found"));
        };
        tokio::time::sleep(*delay).await;
        Ok(FetchOutput {
            bytes: body.clone().into_bytes(),
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                content_type: Some("text/html; charset=utf-8".to_string()),
                byte_len: body.len() as u64,
            },
        })
    }
}

fn urls(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn failed_urls_are_skipped_and_order_is_kept() {
    let server = MockServer::start().await;
    for (route, body) in [("/a", "A"), ("/c", "C")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html(body))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let input: Vec<String> = ["/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    let fetcher = ReqwestFetcher::new(FetchSettings::default());
    let sink = TestSink::new();

    let batch = fetch_batch(&fetcher, &input, &sink, 1).await.unwrap();

    assert_eq!(batch.bodies, ["A", "C"]);
    assert_eq!(batch.successful_urls, [input[0].clone(), input[2].clone()]);
    assert_eq!(batch.bodies.len(), batch.successful_urls.len());
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].url, input[1]);
    assert_eq!(batch.failures[0].error.kind, FailureKind::HttpStatus(500));

    let events = sink.take();
    let requested = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::Requesting { total: 3, .. }))
        .count();
    assert_eq!(requested, 3);
    assert!(events.contains(&EngineEvent::BatchFetched {
        succeeded: 2,
        total: 3
    }));
}

#[tokio::test]
async fn every_url_failing_is_an_error() {
    let fetcher = ScriptedFetcher {
        pages: HashMap::new(),
    };
    let input = urls(&["https://a.example/1", "https://a.example/2"]);

    let err = fetch_batch(&fetcher, &input, &TestSink::new(), 1)
        .await
        .unwrap_err();
    match err {
        BatchError::AllFailed {
            attempted,
            failures,
        } => {
            assert_eq!(attempted, 2);
            assert_eq!(failures.len(), 2);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn empty_input_is_not_a_fetch_failure() {
    let fetcher = ScriptedFetcher {
        pages: HashMap::new(),
    };
    let err = fetch_batch(&fetcher, &[], &TestSink::new(), 4)
        .await
        .unwrap_err();
    assert_eq!(err, BatchError::NothingToFetch);
}

#[tokio::test]
async fn concurrent_fetches_keep_input_order() {
    // Earlier URLs answer later, so completion order is the reverse of input order.
    let input = urls(&[
        "https://a.example/1",
        "https://a.example/2",
        "https://a.example/missing",
        "https://a.example/3",
    ]);
    let mut pages = HashMap::new();
    pages.insert(input[0].clone(), (Duration::from_millis(60), "one".to_string()));
    pages.insert(input[1].clone(), (Duration::from_millis(30), "two".to_string()));
    pages.insert(input[3].clone(), (Duration::from_millis(0), "three".to_string()));
    let fetcher = ScriptedFetcher { pages };

    let batch = fetch_batch(&fetcher, &input, &TestSink::new(), 4)
        .await
        .unwrap();

    assert_eq!(batch.bodies, ["one", "two", "three"]);
    assert_eq!(
        batch.successful_urls,
        [input[0].clone(), input[1].clone(), input[3].clone()]
    );
    assert_eq!(batch.failures[0].url, input[2]);
}
