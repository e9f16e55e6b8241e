//! Discovery of successive result pages.
//!
//! News listings are walked by following "next page" links; the court portal
//! encodes its page number in the URL, so its pages are generated from the seed.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use opal_core::{court_page_url, normalize_url_for_dedupe, parse_court_url};
use opal_logging::{opal_debug, opal_info, opal_warn};
use scraper::Html;
use tokio::sync::Mutex;
use url::Url;

use crate::decode::decode_html;
use crate::fetch::{Fetcher, NullProgressSink, ProgressSink};
use crate::strategy::{selector, visible_text};
use crate::{EngineEvent, FetchError, FetchOutput, JobId};

/// Anchor texts treated as a link to the next listing page.
const NEXT_LINK_TEXTS: &[&str] = &["next", "next page", "older posts", "›", "»", "next »", "next ›"];

/// One page of a paginated source and the URLs to process from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// 1-based.
    pub page_number: u32,
    pub url: String,
    pub article_urls: Vec<String>,
}

#[async_trait::async_trait]
pub trait Paginator: Send {
    /// Next page, or `None` once the limit is reached or no further page exists.
    async fn next_page(&mut self) -> Option<ListingPage>;
}

/// Links found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingLinks {
    pub article_urls: Vec<String>,
    pub next_page: Option<String>,
}

/// Collects article links and the next-page link of a listing page.
///
/// Only http(s) links on the listing's own host are considered. Article links must
/// contain `suffix` in their path when one is given; duplicates keep their first position.
pub fn discover_links(html: &str, page_url: &str, suffix: Option<&str>) -> ListingLinks {
    let Ok(base) = Url::parse(page_url) else {
        return ListingLinks::default();
    };
    let doc = Html::parse_document(html);
    let suffix = suffix.map(str::trim).filter(|s| !s.is_empty());
    let own_page = normalize_url_for_dedupe(base.as_str());

    let next_page = find_next_link(&doc, &base);
    let next_key = next_page.as_deref().map(normalize_url_for_dedupe);

    let mut seen = HashSet::new();
    let mut article_urls = Vec::new();
    if let Some(anchors) = selector("a[href]") {
        for anchor in doc.select(&anchors) {
            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_same_host(href, &base))
            else {
                continue;
            };
            if let Some(suffix) = suffix {
                if !url.path().contains(suffix) {
                    continue;
                }
            }
            let key = normalize_url_for_dedupe(url.as_str());
            if key == own_page || Some(&key) == next_key.as_ref() {
                continue;
            }
            if seen.insert(key) {
                article_urls.push(without_fragment(url));
            }
        }
    }

    ListingLinks {
        article_urls,
        next_page,
    }
}

fn find_next_link(doc: &Html, base: &Url) -> Option<String> {
    let by_rel = ["link[rel~=\"next\"][href]", "a[rel~=\"next\"][href]"]
        .into_iter()
        .filter_map(selector)
        .find_map(|sel| {
            doc.select(&sel)
                .filter_map(|el| el.value().attr("href"))
                .find_map(|href| resolve_same_host(href, base))
        });
    if let Some(url) = by_rel {
        return Some(without_fragment(url));
    }

    let anchors = selector("a[href]")?;
    doc.select(&anchors)
        .find(|anchor| {
            let text = visible_text(*anchor);
            let text = text.trim().to_lowercase();
            NEXT_LINK_TEXTS.contains(&text.as_str())
        })
        .and_then(|anchor| anchor.value().attr("href"))
        .and_then(|href| resolve_same_host(href, base))
        .map(without_fragment)
}

fn resolve_same_host(reference: &str, base: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    let lower = trimmed.to_ascii_lowercase();
    if trimmed.is_empty() || lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    let url = base.join(trimmed).ok()?;
    let web = matches!(url.scheme(), "http" | "https");
    (web && url.host_str() == base.host_str()).then_some(url)
}

fn without_fragment(mut url: Url) -> String {
    url.set_fragment(None);
    url.into()
}

/// Follows next-page links from a seed listing page.
pub struct ListingPaginator {
    fetcher: Arc<dyn Fetcher>,
    next_url: Option<String>,
    suffix: Option<String>,
    max_pages: Option<u32>,
    pages_seen: u32,
    visited: HashSet<String>,
}

impl ListingPaginator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        base_url: impl Into<String>,
        suffix: Option<String>,
        max_pages: Option<u32>,
    ) -> Self {
        Self {
            fetcher,
            next_url: Some(base_url.into()),
            suffix,
            max_pages,
            pages_seen: 0,
            visited: HashSet::new(),
        }
    }

    fn limit_reached(&self) -> bool {
        self.max_pages.is_some_and(|max| self.pages_seen >= max)
    }
}

#[async_trait::async_trait]
impl Paginator for ListingPaginator {
    async fn next_page(&mut self) -> Option<ListingPage> {
        if self.limit_reached() {
            opal_debug!("Page limit of {:?} reached", self.max_pages);
            return None;
        }
        let url = self.next_url.take()?;
        if !self.visited.insert(normalize_url_for_dedupe(&url)) {
            opal_debug!("Listing page {} already visited; stopping", url);
            return None;
        }

        opal_info!("Loading listing page {}: {}", self.pages_seen + 1, url);
        let output = match self
            .fetcher
            .fetch(self.pages_seen as usize, &url, &NullProgressSink)
            .await
        {
            Ok(output) => output,
            Err(err) => {
                opal_warn!("Listing page {} could not be loaded: {}", url, err);
                return None;
            }
        };
        let html = match decode_html(&output.bytes, output.metadata.content_type.as_deref()) {
            Ok(decoded) => decoded.html,
            Err(err) => {
                opal_warn!("Listing page {} could not be decoded: {}", url, err);
                return None;
            }
        };

        let links = discover_links(&html, &output.metadata.final_url, self.suffix.as_deref());
        self.pages_seen += 1;
        self.next_url = links.next_page;
        opal_info!(
            "Found {} article link(s) on listing page {}",
            links.article_urls.len(),
            self.pages_seen
        );

        Some(ListingPage {
            page_number: self.pages_seen,
            url,
            article_urls: links.article_urls,
        })
    }
}

/// Generates court-portal result pages by rewriting the page number of the seed URL.
///
/// The total page count is read from the seed URL; when the seed does not know it,
/// the first page is loaded and the count is read from the URL the portal settles on.
/// That URL then serves as the template for the remaining pages, and the rendered
/// first page is handed to the first batch through [`CourtPaginator::fetcher`].
pub struct CourtPaginator {
    fetcher: Arc<PrimedFetcher>,
    seed_url: String,
    template_url: String,
    max_pages: Option<u32>,
    total_pages: Option<u32>,
    next_index: u32,
}

impl CourtPaginator {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: impl Into<String>, max_pages: Option<u32>) -> Self {
        let seed_url = base_url.into();
        Self {
            fetcher: Arc::new(PrimedFetcher::new(fetcher)),
            template_url: seed_url.clone(),
            seed_url,
            max_pages,
            total_pages: None,
            next_index: 0,
        }
    }

    /// Fetcher for the pages this paginator yields; reuses the page loaded to learn the total.
    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        self.fetcher.clone()
    }

    fn page_url(&self, index: u32) -> String {
        if index == 0 && parse_court_url(&self.seed_url).number.is_none() {
            self.seed_url.clone()
        } else {
            court_page_url(&self.template_url, index)
        }
    }

    async fn resolve_total_pages(&mut self) -> u32 {
        if let Some(total) = parse_court_url(&self.seed_url).total_pages.filter(|t| *t > 0) {
            return total;
        }
        opal_info!("Total page count unknown; loading the first results page");
        let first_url = self.page_url(0);
        match self.fetcher.inner.fetch(0, &first_url, &NullProgressSink).await {
            Ok(output) => {
                let settled = parse_court_url(&output.metadata.final_url);
                if settled.number.is_some() {
                    self.template_url = output.metadata.final_url.clone();
                }
                self.fetcher.prime(first_url, output).await;
                settled.total_pages.filter(|t| *t > 0).unwrap_or(1)
            }
            Err(err) => {
                opal_warn!("First results page could not be loaded: {}", err);
                1
            }
        }
    }
}

#[async_trait::async_trait]
impl Paginator for CourtPaginator {
    async fn next_page(&mut self) -> Option<ListingPage> {
        let total = match self.total_pages {
            Some(total) => total,
            None => {
                let mut total = self.resolve_total_pages().await;
                if let Some(max) = self.max_pages {
                    total = total.min(max);
                }
                opal_info!("Processing {} results page(s)", total);
                self.total_pages = Some(total);
                total
            }
        };
        if self.next_index >= total {
            return None;
        }

        let index = self.next_index;
        self.next_index += 1;
        let url = self.page_url(index);
        Some(ListingPage {
            page_number: index + 1,
            url: url.clone(),
            article_urls: vec![url],
        })
    }
}

/// Serves each primed response once, then defers to the wrapped fetcher.
struct PrimedFetcher {
    inner: Arc<dyn Fetcher>,
    primed: Mutex<HashMap<String, FetchOutput>>,
}

impl PrimedFetcher {
    fn new(inner: Arc<dyn Fetcher>) -> Self {
        Self {
            inner,
            primed: Mutex::new(HashMap::new()),
        }
    }

    async fn prime(&self, url: String, output: FetchOutput) {
        self.primed.lock().await.insert(url, output);
    }
}

#[async_trait::async_trait]
impl Fetcher for PrimedFetcher {
    async fn fetch(
        &self,
        job_id: JobId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError> {
        let primed = self.primed.lock().await.remove(url);
        match primed {
            Some(output) => {
                opal_debug!("Reusing the already loaded {}", url);
                sink.emit(EngineEvent::Downloading {
                    job_id,
                    bytes: output.metadata.byte_len,
                });
                Ok(output)
            }
            None => self.inner.fetch(job_id, url, sink).await,
        }
    }
}
