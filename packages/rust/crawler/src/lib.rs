//! Register crawler.
//!
//! This crate provides:
//! - [`fetcher`]: the [`DocumentFetcher`] seam and its `reqwest` implementation
//! - [`engine`]: the sequential listing walk and detail enrichment
//! - [`progress`]: progress callbacks for the walk

pub mod engine;
pub mod fetcher;
pub mod progress;

pub use engine::{CrawlLimit, CrawlReport, Crawler, FetchFailure, Stage};
pub use fetcher::{DocumentFetcher, HttpFetcher, USER_AGENT};
pub use progress::{CrawlProgress, SilentProgress};
