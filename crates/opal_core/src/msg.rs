#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The paginator produced a listing page and the article URLs it links to.
    ListingDiscovered {
        page_number: u32,
        url: String,
        article_urls: Vec<String>,
    },
    /// The orchestrator finished a batch.
    BatchFinished {
        batch_id: crate::BatchId,
        result: BatchResultKind,
    },
    /// The paginator has no further pages.
    PaginationExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchResultKind {
    /// At least one URL was fetched.
    Completed {
        records: usize,
        skipped_urls: usize,
        extraction_failures: usize,
    },
    /// Every URL of the batch failed to fetch.
    AllFailed { attempted: usize },
}
