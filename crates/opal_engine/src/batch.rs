use futures_util::stream::{self, StreamExt};

use crate::decode::decode_html;
use crate::fetch::{Fetcher, ProgressSink};
use crate::{EngineEvent, FailureKind, FetchError};

/// Successful part of a batch fetch.
///
/// `bodies[i]` was fetched from `successful_urls[i]`; both follow input order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchBatch {
    pub bodies: Vec<String>,
    pub successful_urls: Vec<String>,
    pub failures: Vec<UrlFailure>,
}

impl FetchBatch {
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// `(body, url)` pairs in success order.
    pub fn pages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bodies
            .iter()
            .map(String::as_str)
            .zip(self.successful_urls.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFailure {
    pub url: String,
    pub error: FetchError,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("no URLs to fetch")]
    NothingToFetch,
    #[error("all {attempted} URLs failed to process")]
    AllFailed {
        attempted: usize,
        failures: Vec<UrlFailure>,
    },
}

/// Fetches every URL once, skipping the ones that fail.
///
/// Up to `concurrency` requests run at a time; results keep input order either way.
/// Fails only when `urls` is empty or nothing could be fetched.
pub async fn fetch_batch(
    fetcher: &dyn Fetcher,
    urls: &[String],
    sink: &dyn ProgressSink,
    concurrency: usize,
) -> Result<FetchBatch, BatchError> {
    if urls.is_empty() {
        return Err(BatchError::NothingToFetch);
    }
    let total = urls.len();

    let outcomes: Vec<(usize, Result<String, FetchError>)> = stream::iter(urls.iter().enumerate())
        .map(|(job_id, url)| async move {
            sink.emit(EngineEvent::Requesting {
                job_id,
                total,
                url: url.clone(),
            });
            let outcome = fetch_one(fetcher, job_id, url, sink).await;
            match &outcome {
                Ok(body) => sink.emit(EngineEvent::Fetched {
                    job_id,
                    url: url.clone(),
                    bytes: body.len() as u64,
                }),
                Err(error) => sink.emit(EngineEvent::Skipped {
                    job_id,
                    url: url.clone(),
                    error: error.clone(),
                }),
            }
            (job_id, outcome)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut batch = FetchBatch::default();
    for (job_id, outcome) in outcomes {
        let url = urls[job_id].clone();
        match outcome {
            Ok(body) => {
                batch.bodies.push(body);
                batch.successful_urls.push(url);
            }
            Err(error) => batch.failures.push(UrlFailure { url, error }),
        }
    }

    sink.emit(EngineEvent::BatchFetched {
        succeeded: batch.len(),
        total,
    });

    if batch.is_empty() {
        return Err(BatchError::AllFailed {
            attempted: total,
            failures: batch.failures,
        });
    }
    Ok(batch)
}

async fn fetch_one(
    fetcher: &dyn Fetcher,
    job_id: usize,
    url: &str,
    sink: &dyn ProgressSink,
) -> Result<String, FetchError> {
    let output = fetcher.fetch(job_id, url, sink).await?;
    decode_html(&output.bytes, output.metadata.content_type.as_deref())
        .map(|decoded| decoded.html)
        .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))
}
