mod support;

use std::time::Duration;

use opal_engine::{BrowserFetcher, BrowserSettings, FailureKind, Fetcher};
use support::TestSink;

fn quick(endpoint: &str) -> BrowserSettings {
    BrowserSettings {
        endpoint: endpoint.to_string(),
        page_load_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(10),
        settle_delay: Duration::ZERO,
        rate_limit: Duration::ZERO,
        ..BrowserSettings::default()
    }
}

#[tokio::test]
async fn invalid_url_is_rejected_before_attaching() {
    let fetcher = BrowserFetcher::new(quick("http://127.0.0.1:9"));
    let sink = TestSink::default();

    let err = fetcher.fetch(0, "not a url", &sink).await.err().unwrap();

    assert_eq!(err.kind, FailureKind::InvalidUrl);
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn unreachable_browser_is_a_driver_failure() {
    let fetcher = BrowserFetcher::new(quick("http://127.0.0.1:9"));
    let sink = TestSink::default();

    let first = fetcher
        .fetch(0, "https://portal.example/results", &sink)
        .await
        .err()
        .unwrap();
    assert_eq!(first.kind, FailureKind::Driver);
    assert!(first.message.contains("127.0.0.1:9"));

    // Nothing was attached, so the next page tries again and fails the same way.
    let second = fetcher
        .fetch(1, "https://portal.example/results", &sink)
        .await
        .err()
        .unwrap();
    assert_eq!(second.kind, FailureKind::Driver);
    assert!(fetcher.close().await.is_ok());
}

#[tokio::test]
#[ignore] // Requires Chromium running with --remote-debugging-port=9222
async fn renders_a_page_in_a_running_browser() {
    let fetcher = BrowserFetcher::new(quick(opal_engine::DEFAULT_DEVTOOLS_URL));
    let sink = TestSink::default();

    let output = fetcher
        .fetch(
            0,
            "data:text/html,<script>document.write('<table><tr><td>row</td></tr></table>')</script>",
            &sink,
        )
        .await
        .unwrap();

    let html = String::from_utf8(output.bytes).unwrap();
    assert!(html.contains("<td>row</td>"));
    assert_eq!(output.metadata.redirect_count, 0);
    fetcher.close().await.unwrap();
}
