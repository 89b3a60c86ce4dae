//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use qualreg_crawler::{CrawlLimit, CrawlProgress, CrawlReport, Crawler};
use qualreg_extract::{parse_institution, parse_listing, parse_program_details};
use qualreg_shared::{
    AppConfig, CrawlConfig, ErrorPolicy, Institution, ProgramDetails, init_config, load_config,
    load_config_from, validate_timeout,
};
use scraper::Html;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// qualreg: harvest the qualifications register.
#[derive(Parser)]
#[command(
    name = "qualreg",
    version,
    about = "Harvest accredited institutions and programmes from the qualifications register as JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.qualreg/qualreg.toml.
    #[arg(long = "config", global = true, env = "QUALREG_CONFIG")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl the register and write every institution as JSON.
    Crawl {
        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Stop after this many linked institutions.
        #[arg(long)]
        limit: Option<usize>,

        /// Stop at the first failed detail page instead of skipping it.
        #[arg(long)]
        fail_fast: bool,

        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,

        /// Also write the full crawl report (errors, completeness) to this file.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Delay between requests in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Fetch one institution with one programme.
    Sample {
        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Pretty-print the JSON.
        #[arg(long)]
        pretty: bool,
    },

    /// Run a single page parser on a saved HTML file.
    Inspect {
        /// Which parser to run.
        kind: PageKind,

        /// Saved HTML page.
        file: PathBuf,

        /// URL the page was fetched from (resolves pagination links).
        #[arg(long)]
        url: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Page kinds understood by `inspect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum PageKind {
    Listing,
    Institution,
    Program,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "qualreg=info",
        1 => "qualreg=debug",
        _ => "qualreg=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_file.as_deref();
    match cli.command {
        Command::Crawl {
            out,
            limit,
            fail_fast,
            pretty,
            report,
            delay_ms,
            timeout_secs,
        } => {
            let overrides = CrawlOverrides {
                fail_fast,
                delay_ms,
                timeout_secs,
            };
            cmd_crawl(
                config_path,
                &overrides,
                limit,
                out.as_deref(),
                report.as_deref(),
                pretty,
            )
            .await
        }
        Command::Sample { out, pretty } => cmd_sample(config_path, out.as_deref(), pretty).await,
        Command::Inspect { kind, file, url } => {
            cmd_inspect(config_path, kind, &file, url.as_deref())
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Config resolution
// ---------------------------------------------------------------------------

/// Flag values that override the config file.
#[derive(Debug, Default)]
struct CrawlOverrides {
    fail_fast: bool,
    delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
}

fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn resolve_crawl_config(app: &AppConfig, overrides: &CrawlOverrides) -> Result<CrawlConfig> {
    let mut config = CrawlConfig::from_app(app)?;
    if overrides.fail_fast {
        config.error_policy = ErrorPolicy::FailFast;
    }
    if let Some(ms) = overrides.delay_ms {
        config.request_delay_ms = ms;
    }
    if let Some(secs) = overrides.timeout_secs {
        validate_timeout(secs)?;
        config.timeout_secs = secs;
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_crawl(
    config_path: Option<&Path>,
    overrides: &CrawlOverrides,
    limit: Option<usize>,
    out: Option<&Path>,
    report_path: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let app = load_app_config(config_path)?;
    let config = resolve_crawl_config(&app, overrides)?;

    info!(
        listing_url = %config.listing_url,
        limit = ?limit,
        policy = ?config.error_policy,
        "crawling register"
    );

    let crawler = Crawler::new(config)?;
    let progress = CliProgress::new();
    let crawl_limit = CrawlLimit {
        institutions: limit,
        programs_per_institution: None,
    };
    let report = crawler.crawl(crawl_limit, &progress).await;

    write_json(&report.institutions, out, pretty)?;
    if let Some(path) = report_path {
        write_json(&report, Some(path), true)?;
    }

    print_summary(&report);
    finish(&report)
}

async fn cmd_sample(config_path: Option<&Path>, out: Option<&Path>, pretty: bool) -> Result<()> {
    let app = load_app_config(config_path)?;
    let config = resolve_crawl_config(&app, &CrawlOverrides::default())?;

    let crawler = Crawler::new(config)?;
    let progress = CliProgress::new();
    let report = crawler.crawl_one(&progress).await;

    match report.institutions.first() {
        Some(institution) => write_json(institution, out, pretty)?,
        None => warn!("no linked institution reached"),
    }

    finish(&report)
}

fn cmd_inspect(
    config_path: Option<&Path>,
    kind: PageKind,
    file: &Path,
    url: Option<&str>,
) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("failed to read {}", file.display()))?;
    let doc = Html::parse_document(&content);

    match kind {
        PageKind::Listing => {
            let app = load_app_config(config_path)?;
            let page_url = match url {
                Some(u) => Url::parse(u).map_err(|e| eyre!("invalid URL '{u}': {e}"))?,
                None => CrawlConfig::from_app(&app)?.listing_url,
            };
            let page = parse_listing(&doc, &page_url, &app.source.next_page_pattern);
            let value = serde_json::json!({
                "entries": page.entries,
                "next_page": page.next_page.map(|u| u.to_string()),
            });
            write_json(&value, None, true)
        }
        PageKind::Institution => {
            let mut institution = Institution::default();
            let programs = parse_institution(&doc, &mut institution);
            let value = serde_json::json!({
                "contact": institution.contact,
                "programs": programs,
            });
            write_json(&value, None, true)
        }
        PageKind::Program => {
            let mut details = ProgramDetails::default();
            parse_program_details(&doc, &mut details);
            write_json(&details, None, true)
        }
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn write_json<T: Serialize + ?Sized>(value: &T, out: Option<&Path>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };

    match out {
        Some(path) => std::fs::write(path, json + "\n")
            .wrap_err_with(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn print_summary(report: &CrawlReport) {
    eprintln!();
    eprintln!("  Institutions: {}", report.institutions.len());
    eprintln!("  Programmes:   {}", report.program_count());
    eprintln!("  Pages:        {}", report.pages_visited);
    eprintln!("  Errors:       {}", report.errors.len());
    eprintln!("  Time:         {:.1}s", report.duration.as_secs_f64());
    eprintln!();
}

/// Turn an incomplete crawl into a non-zero exit after output has been written.
fn finish(report: &CrawlReport) -> Result<()> {
    if report.complete {
        return Ok(());
    }
    for failure in &report.errors {
        warn!(url = %failure.url, stage = ?failure.stage, "{}", failure.message);
    }
    Err(eyre!(
        "crawl incomplete: {} fetch error(s); output holds the records collected so far",
        report.errors.len()
    ))
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl CrawlProgress for CliProgress {
    fn page(&self, url: &Url, pages_visited: usize) {
        self.spinner
            .set_message(format!("Listing page {pages_visited}: {url}"));
    }

    fn institution(&self, name: &str, enriched: usize) {
        self.spinner.set_message(format!("[{enriched}] {name}"));
    }

    fn program(&self, name: &str) {
        self.spinner.set_message(format!("  {name}"));
    }

    fn done(&self, _report: &CrawlReport) {
        self.spinner.finish_and_clear();
    }
}
