//! Fetching through an already running Chromium over the DevTools protocol.
//!
//! Used for sites that build their content client-side. The browser must be
//! started separately with `--remote-debugging-port`; this module only attaches to it.

use std::time::{Duration, Instant};

use chromiumoxide::browser::Browser;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use opal_logging::{opal_debug, opal_info, opal_warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::fetch::{Fetcher, ProgressSink};
use crate::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, JobId};

pub const DEFAULT_DEVTOOLS_URL: &str = "http://localhost:9222";

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// DevTools endpoint, either `http://host:port` or a `ws://` debugger URL.
    pub endpoint: String,
    /// Budget for the navigation and again for `wait_for` to appear.
    pub page_load_timeout: Duration,
    pub poll_interval: Duration,
    /// Pause once the content is present, for late scripts to finish.
    pub settle_delay: Duration,
    /// Minimum spacing between two navigations.
    pub rate_limit: Duration,
    /// CSS selector that marks the page as rendered.
    pub wait_for: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DEVTOOLS_URL.to_string(),
            page_load_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
            settle_delay: Duration::from_secs(2),
            rate_limit: Duration::from_secs(3),
            wait_for: "table".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("could not attach to browser at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: CdpError,
    },
    #[error("devtools command failed: {0}")]
    Cdp(#[from] CdpError),
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: CdpError,
    },
    #[error("navigation to {url} did not finish within {waited:?}")]
    NavigationTimeout { url: String, waited: Duration },
    #[error("`{selector}` did not appear within {waited:?}")]
    ContentTimeout { selector: String, waited: Duration },
}

impl BrowserError {
    /// Whether the tab can no longer be trusted for the next page.
    fn ends_session(&self) -> bool {
        matches!(
            self,
            BrowserError::Cdp(_) | BrowserError::Navigation { .. } | BrowserError::NavigationTimeout { .. }
        )
    }
}

impl From<BrowserError> for FetchError {
    fn from(err: BrowserError) -> Self {
        let kind = match err {
            BrowserError::NavigationTimeout { .. } | BrowserError::ContentTimeout { .. } => {
                FailureKind::Timeout
            }
            _ => FailureKind::Driver,
        };
        FetchError::new(kind, err.to_string())
    }
}

/// One tab in the attached browser plus the task pumping its DevTools events.
struct Session {
    _browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl Drop for Session {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[derive(Default)]
struct DriverState {
    session: Option<Session>,
    last_navigation: Option<Instant>,
}

/// Loads pages in one shared browser tab and returns the rendered markup.
///
/// Page loads are serialized; concurrent callers wait their turn.
pub struct BrowserFetcher {
    settings: BrowserSettings,
    state: Mutex<DriverState>,
}

impl BrowserFetcher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(DriverState::default()),
        }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    /// Closes the tab, if one was opened. The browser itself keeps running.
    pub async fn close(&self) -> Result<(), FetchError> {
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.take() {
            opal_debug!("Closing browser tab");
            session
                .page
                .clone()
                .close()
                .await
                .map_err(BrowserError::from)?;
        }
        Ok(())
    }

    async fn attach(&self) -> Result<Session, BrowserError> {
        let endpoint = self.settings.endpoint.clone();
        let (browser, mut handler) =
            Browser::connect(endpoint.clone())
                .await
                .map_err(|source| BrowserError::Connect {
                    endpoint: endpoint.clone(),
                    source,
                })?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler.abort();
                return Err(err.into());
            }
        };
        opal_info!("Attached to browser at {}", endpoint);
        Ok(Session {
            _browser: browser,
            page,
            handler,
        })
    }

    async fn wait_for_content(&self, page: &Page) -> Result<(), BrowserError> {
        let started = Instant::now();
        loop {
            let found = page.find_elements(self.settings.wait_for.as_str()).await?;
            if !found.is_empty() {
                return Ok(());
            }
            if started.elapsed() >= self.settings.page_load_timeout {
                return Err(BrowserError::ContentTimeout {
                    selector: self.settings.wait_for.clone(),
                    waited: self.settings.page_load_timeout,
                });
            }
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn render(
        &self,
        state: &mut DriverState,
        url: &str,
    ) -> Result<(String, String), BrowserError> {
        let page = match &state.session {
            Some(session) => session.page.clone(),
            None => {
                let session = self.attach().await?;
                let page = session.page.clone();
                state.session = Some(session);
                page
            }
        };

        if let Some(last) = state.last_navigation {
            let since = last.elapsed();
            if since < self.settings.rate_limit {
                tokio::time::sleep(self.settings.rate_limit - since).await;
            }
        }
        state.last_navigation = Some(Instant::now());

        let waited = self.settings.page_load_timeout;
        match tokio::time::timeout(waited, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(source)) => {
                return Err(BrowserError::Navigation {
                    url: url.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(BrowserError::NavigationTimeout {
                    url: url.to_string(),
                    waited,
                })
            }
        }
        self.wait_for_content(&page).await?;
        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }

        let source = page.content().await?;
        let current = page
            .url()
            .await?
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());
        Ok((source, current))
    }
}

#[async_trait::async_trait]
impl Fetcher for BrowserFetcher {
    async fn fetch(
        &self,
        job_id: JobId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<FetchOutput, FetchError> {
        url::Url::parse(url).map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let mut state = self.state.lock().await;
        let (source, final_url) = match self.render(&mut state, url).await {
            Ok(page) => page,
            Err(err) => {
                if err.ends_session() {
                    opal_warn!("Dropping browser tab after failed load of {}", url);
                    state.session = None;
                }
                return Err(err.into());
            }
        };
        drop(state);

        let bytes = source.into_bytes();
        sink.emit(EngineEvent::Downloading {
            job_id,
            bytes: bytes.len() as u64,
        });
        let metadata = FetchMetadata {
            original_url: url.to_string(),
            redirect_count: usize::from(final_url != url),
            final_url,
            content_type: Some("text/html; charset=utf-8".to_string()),
            byte_len: bytes.len() as u64,
        };
        Ok(FetchOutput { bytes, metadata })
    }
}
