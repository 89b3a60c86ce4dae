//! Crawl progress callbacks.

use url::Url;

use crate::engine::CrawlReport;

/// Progress callback for the crawl.
///
/// Implemented by the CLI (spinner) and [`SilentProgress`] for tests.
pub trait CrawlProgress: Send + Sync {
    /// A listing page was fetched; `pages_visited` counts it.
    fn page(&self, url: &Url, pages_visited: usize);
    /// A linked institution has been enriched.
    fn institution(&self, name: &str, enriched: usize);
    /// A program was appended to the current institution.
    fn program(&self, name: &str);
    /// The walk has ended.
    fn done(&self, report: &CrawlReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl CrawlProgress for SilentProgress {
    fn page(&self, _url: &Url, _pages_visited: usize) {}
    fn institution(&self, _name: &str, _enriched: usize) {}
    fn program(&self, _name: &str) {}
    fn done(&self, _report: &CrawlReport) {}
}
