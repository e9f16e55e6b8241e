use std::sync::Arc;

use opal_core::{BatchResultKind, ResultSet};
use opal_logging::{opal_debug, opal_warn};

use crate::batch::{fetch_batch, BatchError, UrlFailure};
use crate::fetch::{Fetcher, LogProgressSink, ProgressSink};
use crate::strategy::{ExtractionError, ExtractionStrategy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    pub url: String,
    pub error: ExtractionError,
}

/// What happened to each URL of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub attempted: usize,
    pub fetched: Vec<String>,
    pub skipped: Vec<UrlFailure>,
    pub extraction_failures: Vec<ExtractionFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub records: ResultSet,
    pub report: BatchReport,
}

impl BatchOutcome {
    pub fn result_kind(&self) -> BatchResultKind {
        BatchResultKind::Completed {
            records: self.records.len(),
            skipped_urls: self.report.skipped.len(),
            extraction_failures: self.report.extraction_failures.len(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Runs fetch then extract over a batch of URLs with one bound strategy.
#[derive(Clone)]
pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    strategy: Arc<dyn ExtractionStrategy>,
    sink: Arc<dyn ProgressSink>,
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(fetcher: Arc<dyn Fetcher>, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        Self {
            fetcher,
            strategy,
            sink: Arc::new(LogProgressSink),
            concurrency: 1,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn strategy(&self) -> &dyn ExtractionStrategy {
        self.strategy.as_ref()
    }

    /// Fetches `urls`, then parses every success in success order.
    ///
    /// Pages the strategy cannot use are skipped and listed in the report.
    pub async fn process(&self, urls: &[String]) -> Result<BatchOutcome, BatchError> {
        let batch = fetch_batch(
            self.fetcher.as_ref(),
            urls,
            self.sink.as_ref(),
            self.concurrency,
        )
        .await?;

        let mut records = ResultSet::new();
        let mut report = BatchReport {
            attempted: urls.len(),
            ..BatchReport::default()
        };
        for (html, url) in batch.pages() {
            match self.strategy.parse_article(html, url) {
                Ok(parsed) => {
                    opal_debug!("{} yielded {} record(s) from {}", self.strategy.name(), parsed.len(), url);
                    records.extend(parsed);
                }
                Err(error) => {
                    opal_warn!("Skipping page without usable content: {}", error);
                    report.extraction_failures.push(ExtractionFailure {
                        url: url.to_string(),
                        error,
                    });
                }
            }
        }
        report.fetched = batch.successful_urls;
        report.skipped = batch.failures;

        Ok(BatchOutcome { records, report })
    }

    /// Same as [`process`](Self::process), serialized as a JSON array.
    pub async fn process_to_json(&self, urls: &[String]) -> Result<String, OrchestratorError> {
        let outcome = self.process(urls).await?;
        Ok(outcome.records.to_json()?)
    }
}
