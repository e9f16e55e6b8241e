//! Optional RON settings file.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```ron
//! (
//!     output_dir: "out",
//!     concurrency: 4,
//!     browser: (endpoint: "http://localhost:9333", settle_delay_secs: 1),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use opal_engine::{BrowserSettings, FetchSettings, DEFAULT_DEVTOOLS_URL, DEFAULT_USER_AGENT};
use opal_logging::{opal_debug, opal_info};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "opal.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpalConfig {
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    pub browser: BrowserConfig,
}

impl Default for OpalConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        Self {
            output_dir: PathBuf::from("."),
            concurrency: fetch.concurrency,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            redirect_limit: fetch.redirect_limit,
            max_bytes: fetch.max_bytes,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browser: BrowserConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// DevTools endpoint of a browser started with `--remote-debugging-port`.
    pub endpoint: String,
    pub page_load_timeout_secs: u64,
    pub settle_delay_secs: u64,
    pub rate_limit_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let driver = BrowserSettings::default();
        Self {
            endpoint: DEFAULT_DEVTOOLS_URL.to_string(),
            page_load_timeout_secs: driver.page_load_timeout.as_secs(),
            settle_delay_secs: driver.settle_delay.as_secs(),
            rate_limit_secs: driver.rate_limit.as_secs(),
        }
    }
}

impl OpalConfig {
    /// Reads `path`; a missing file yields the defaults, a malformed one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                opal_debug!("No config file at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {}", path.display()))
            }
        };
        let config = ron::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        opal_info!("Loaded settings from {:?}", path);
        Ok(config)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone(),
            concurrency: self.concurrency.max(1),
            ..FetchSettings::default()
        }
    }

    pub fn browser_settings(&self) -> BrowserSettings {
        BrowserSettings {
            endpoint: self.browser.endpoint.clone(),
            page_load_timeout: Duration::from_secs(self.browser.page_load_timeout_secs),
            settle_delay: Duration::from_secs(self.browser.settle_delay_secs),
            rate_limit: Duration::from_secs(self.browser.rate_limit_secs),
            ..BrowserSettings::default()
        }
    }
}
