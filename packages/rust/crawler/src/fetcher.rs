//! Page fetching.
//!
//! [`DocumentFetcher`] hands back the raw body so callers parse it in a
//! synchronous scope; `scraper::Html` never lives across an `.await`.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;
use url::Url;

use qualreg_shared::{CrawlConfig, HarvestError, Result};

/// Default User-Agent for register requests.
pub const USER_AGENT: &str = concat!("qualreg/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Retrieves the HTML body at a URL.
///
/// Every failure (transport, non-success status, timeout) is a
/// [`HarvestError::Fetch`]. Implementations make exactly one attempt.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// `reqwest`-backed fetcher. One client (and connection pool) per crawl.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    request_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let user_agent = config.user_agent.as_deref().unwrap_or(USER_AGENT);
        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HarvestError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }
}

impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| HarvestError::fetch(url.as_str(), describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::fetch(url.as_str(), format!("HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| HarvestError::fetch(url.as_str(), format!("body read failed: {}", describe(&e))))
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    }
}
