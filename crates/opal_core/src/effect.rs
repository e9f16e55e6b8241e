#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch and parse these URLs as one batch.
    ProcessBatch {
        batch_id: crate::BatchId,
        urls: Vec<String>,
    },
    /// The crawl is over; nothing else will be requested.
    Finish { outcome: CrawlOutcome },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// At least one batch fetched something; results should be written.
    Completed { records: usize },
    /// Batches were attempted but every one of them failed.
    AllBatchesFailed { batches: usize },
    /// Pagination produced no URLs to fetch.
    NothingToFetch,
}
