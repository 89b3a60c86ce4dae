//! Crawl orchestrator.
//!
//! Walks the paginated institution listing, enriches each linked institution
//! with its detail page and each linked program with its own detail page, and
//! collects everything into a [`CrawlReport`]. Fetches are strictly sequential.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use scraper::Html;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use qualreg_extract::{parse_institution, parse_listing, parse_program_details};
use qualreg_shared::{CrawlConfig, ErrorPolicy, HarvestError, Institution, Result};

use crate::fetcher::{DocumentFetcher, HttpFetcher};
use crate::progress::CrawlProgress;

// ---------------------------------------------------------------------------
// Limits and report
// ---------------------------------------------------------------------------

/// Bounds on a crawl. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlLimit {
    /// Stop after this many linked institutions have been enriched.
    pub institutions: Option<usize>,
    /// Keep at most this many programs per institution.
    pub programs_per_institution: Option<usize>,
}

impl CrawlLimit {
    pub const UNBOUNDED: Self = Self {
        institutions: None,
        programs_per_institution: None,
    };

    /// One enriched institution with one program.
    pub const SAMPLE: Self = Self {
        institutions: Some(1),
        programs_per_institution: Some(1),
    };

    fn institutions_reached(&self, enriched: usize) -> bool {
        self.institutions.is_some_and(|max| enriched >= max)
    }
}

/// Which kind of page a failed fetch was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Listing,
    Institution,
    Program,
}

/// A recorded fetch error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub url: String,
    pub stage: Stage,
    pub message: String,
}

/// Outcome of one traversal.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Every listing entry reached, enriched or not, in listing order.
    pub institutions: Vec<Institution>,
    /// `true` when the walk ended on its own (last page or limit) without fetch errors.
    pub complete: bool,
    /// Listing pages successfully fetched.
    pub pages_visited: usize,
    pub errors: Vec<FetchFailure>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl CrawlReport {
    pub fn program_count(&self) -> usize {
        self.institutions.iter().map(|i| i.programs.len()).sum()
    }
}

/// Whether the walk may go on after a detail step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Sequential register crawler.
pub struct Crawler<F = HttpFetcher> {
    config: CrawlConfig,
    fetcher: F,
}

impl Crawler<HttpFetcher> {
    /// Create a crawler backed by an HTTP client built from `config`.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }
}

impl<F: DocumentFetcher> Crawler<F> {
    pub fn with_fetcher(config: CrawlConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl the whole register.
    pub async fn crawl_all(&self, progress: &dyn CrawlProgress) -> CrawlReport {
        self.crawl(CrawlLimit::UNBOUNDED, progress).await
    }

    /// Crawl just far enough to enrich one institution with one program.
    ///
    /// The report holds only that institution; unlinked entries seen on the
    /// way are dropped.
    pub async fn crawl_one(&self, progress: &dyn CrawlProgress) -> CrawlReport {
        let mut report = self.crawl(CrawlLimit::SAMPLE, progress).await;
        report.institutions.retain(Institution::is_linked);
        report.institutions.truncate(1);
        report
    }

    /// Walk the listing from the configured start page, honouring `limit`.
    #[instrument(skip_all, fields(listing_url = %self.config.listing_url))]
    pub async fn crawl(&self, limit: CrawlLimit, progress: &dyn CrawlProgress) -> CrawlReport {
        let started_at = Utc::now();
        let start = Instant::now();

        let mut institutions: Vec<Institution> = Vec::new();
        let mut errors: Vec<FetchFailure> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut pages_visited = 0usize;
        let mut enriched = 0usize;
        let mut next_page = Some(self.config.listing_url.clone());

        info!(
            policy = ?self.config.error_policy,
            max_institutions = ?limit.institutions,
            "starting crawl"
        );

        let ended_naturally = 'walk: loop {
            let Some(page_url) = next_page.take() else {
                break true;
            };
            if !visited.insert(page_url.to_string()) {
                warn!(%page_url, "next page already visited, stopping pagination");
                break true;
            }

            let body = match self.fetcher.fetch(&page_url).await {
                Ok(body) => body,
                Err(e) => {
                    record_failure(&mut errors, Stage::Listing, &page_url, &e);
                    break false;
                }
            };
            pages_visited += 1;

            let page = {
                let doc = Html::parse_document(&body);
                parse_listing(&doc, &page_url, &self.config.next_page_pattern)
            };
            info!(%page_url, entries = page.entries.len(), "listing page parsed");
            progress.page(&page_url, pages_visited);

            for mut institution in page.entries {
                if !institution.is_linked() {
                    debug!(name = %institution.name, "unlinked entry, not enriched");
                    institutions.push(institution);
                    continue;
                }
                if limit.institutions_reached(enriched) {
                    debug!(enriched, "institution limit reached");
                    break 'walk true;
                }

                let flow = self
                    .enrich_institution(&mut institution, limit, &mut errors, progress)
                    .await;
                enriched += 1;
                progress.institution(&institution.name, enriched);
                institutions.push(institution);

                if flow == Flow::Stop {
                    break 'walk false;
                }
                if limit.institutions_reached(enriched) {
                    debug!(enriched, "institution limit reached");
                    break 'walk true;
                }
            }

            next_page = page.next_page;
        };

        let report = CrawlReport {
            complete: ended_naturally && errors.is_empty(),
            institutions,
            pages_visited,
            errors,
            started_at,
            duration: start.elapsed(),
        };

        info!(
            institutions = report.institutions.len(),
            programs = report.program_count(),
            pages = report.pages_visited,
            errors = report.errors.len(),
            complete = report.complete,
            duration_ms = report.duration.as_millis(),
            "crawl completed"
        );
        progress.done(&report);

        report
    }

    /// Fill contact data and programs of a linked institution.
    #[instrument(skip_all, fields(id = %institution.id))]
    async fn enrich_institution(
        &self,
        institution: &mut Institution,
        limit: CrawlLimit,
        errors: &mut Vec<FetchFailure>,
        progress: &dyn CrawlProgress,
    ) -> Flow {
        let url = self.config.institution_url(&institution.id);
        let body = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                record_failure(errors, Stage::Institution, &url, &e);
                return self.flow_after_failure();
            }
        };

        let summaries = {
            let doc = Html::parse_document(&body);
            parse_institution(&doc, institution)
        };
        debug!(programs = summaries.len(), "institution detail parsed");

        let max_programs = limit.programs_per_institution.unwrap_or(usize::MAX);
        for mut program in summaries.into_iter().take(max_programs) {
            let mut flow = Flow::Continue;

            if program.is_linked() {
                let url = self
                    .config
                    .program_url(&program.reference_number, &program.id);
                match self.fetcher.fetch(&url).await {
                    Ok(body) => {
                        let doc = Html::parse_document(&body);
                        parse_program_details(&doc, &mut program.details);
                    }
                    Err(e) => {
                        record_failure(errors, Stage::Program, &url, &e);
                        flow = self.flow_after_failure();
                    }
                }
            }

            progress.program(&program.name);
            institution.programs.push(program);

            if flow == Flow::Stop {
                return Flow::Stop;
            }
        }

        Flow::Continue
    }

    fn flow_after_failure(&self) -> Flow {
        match self.config.error_policy {
            ErrorPolicy::Continue => Flow::Continue,
            ErrorPolicy::FailFast => Flow::Stop,
        }
    }
}

fn record_failure(errors: &mut Vec<FetchFailure>, stage: Stage, url: &Url, err: &HarvestError) {
    warn!(%url, ?stage, error = %err, "fetch failed");
    let message = match err {
        HarvestError::Fetch { message, .. } => message.clone(),
        other => other.to_string(),
    };
    errors.push(FetchFailure {
        url: url.to_string(),
        stage,
        message,
    });
}
