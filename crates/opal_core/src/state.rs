use std::collections::HashSet;

use url::Url;

use crate::BatchResultKind;

pub type BatchId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Crawling,
    /// Pagination is exhausted; waiting for in-flight batches.
    Draining,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub batch_id: BatchId,
    pub page_number: u32,
    pub listing_url: String,
    pub url_count: usize,
    pub result: Option<BatchResultKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CrawlSummary {
    pub listing_pages: usize,
    pub batches: usize,
    pub completed_batches: usize,
    pub failed_batches: usize,
    pub records: usize,
    pub skipped_urls: usize,
    pub extraction_failures: usize,
    pub duplicate_urls: usize,
}

/// Bookkeeping for one crawl: which URLs were already handed out and how each batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrawlState {
    session: SessionState,
    seen: HashSet<String>,
    batches: Vec<BatchSummary>,
    next_batch_id: BatchId,
    listing_pages: usize,
    duplicate_urls: usize,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn batches(&self) -> &[BatchSummary] {
        &self.batches
    }

    pub fn summary(&self) -> CrawlSummary {
        let mut summary = CrawlSummary {
            listing_pages: self.listing_pages,
            batches: self.batches.len(),
            duplicate_urls: self.duplicate_urls,
            ..CrawlSummary::default()
        };
        for batch in &self.batches {
            match batch.result {
                Some(BatchResultKind::Completed {
                    records,
                    skipped_urls,
                    extraction_failures,
                }) => {
                    summary.completed_batches += 1;
                    summary.records += records;
                    summary.skipped_urls += skipped_urls;
                    summary.extraction_failures += extraction_failures;
                }
                Some(BatchResultKind::AllFailed { attempted }) => {
                    summary.failed_batches += 1;
                    summary.skipped_urls += attempted;
                }
                None => {}
            }
        }
        summary
    }

    pub(crate) fn set_session(&mut self, session: SessionState) {
        self.session = session;
    }

    pub(crate) fn note_listing_page(&mut self) {
        self.listing_pages += 1;
    }

    /// Keeps URLs not handed out before, in order; duplicates are counted and dropped.
    pub(crate) fn take_unseen(&mut self, urls: Vec<String>) -> Vec<String> {
        let mut fresh = Vec::with_capacity(urls.len());
        for url in urls {
            if self.seen.insert(normalize_url_for_dedupe(&url)) {
                fresh.push(url);
            } else {
                self.duplicate_urls += 1;
            }
        }
        fresh
    }

    pub(crate) fn open_batch(&mut self, page_number: u32, listing_url: String, url_count: usize) -> BatchId {
        self.next_batch_id += 1;
        let batch_id = self.next_batch_id;
        self.batches.push(BatchSummary {
            batch_id,
            page_number,
            listing_url,
            url_count,
            result: None,
        });
        batch_id
    }

    /// Records the result; returns false for unknown or already closed batches.
    pub(crate) fn close_batch(&mut self, batch_id: BatchId, result: BatchResultKind) -> bool {
        match self
            .batches
            .iter_mut()
            .find(|batch| batch.batch_id == batch_id && batch.result.is_none())
        {
            Some(batch) => {
                batch.result = Some(result);
                true
            }
            None => false,
        }
    }

    pub(crate) fn has_open_batches(&self) -> bool {
        self.batches.iter().any(|batch| batch.result.is_none())
    }
}

/// Canonical form used to detect the same article linked from several listing pages:
/// fragment dropped and trailing slash trimmed. Unparsable input is only trimmed.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            let path = url.path().to_string();
            if path.len() > 1 && path.ends_with('/') {
                url.set_path(path.trim_end_matches('/'));
            }
            url.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}
