//! Application configuration for qualreg.
//!
//! User config lives at `~/.qualreg/qualreg.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{HarvestError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "qualreg.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".qualreg";

// ---------------------------------------------------------------------------
// Config structs (matching qualreg.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Register endpoints.
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Crawl policies.
    #[serde(default)]
    pub crawl: CrawlPoliciesConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// First listing page (directory root).
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Institution detail page; receives `?IDAkrIPTS=<id>`.
    #[serde(default = "default_institution_detail_url")]
    pub institution_detail_url: String,

    /// Program detail page; receives `?NoRujA=<ref>&IdAkrKP=<id>`.
    #[serde(default = "default_program_detail_url")]
    pub program_detail_url: String,

    /// Substring identifying pagination anchors on listing pages.
    #[serde(default = "default_next_page_pattern")]
    pub next_page_pattern: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            institution_detail_url: default_institution_detail_url(),
            program_detail_url: default_program_detail_url(),
            next_page_pattern: default_next_page_pattern(),
        }
    }
}

fn default_listing_url() -> String {
    "https://www2.mqa.gov.my/mqr/english/eakrbyipts.cfm".into()
}
fn default_institution_detail_url() -> String {
    "https://www2.mqa.gov.my/mqr/english/eakrKPList.cfm".into()
}
fn default_program_detail_url() -> String {
    "https://www2.mqa.gov.my/mqr/english/epapar.cfm".into()
}
fn default_next_page_pattern() -> String {
    "eakrbyipts.cfm?StartRow=".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout; expiry counts as a fetch error.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum ms between consecutive requests.
    #[serde(default = "default_request_delay")]
    pub request_delay_ms: u64,

    /// Overrides the built-in User-Agent when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay(),
            user_agent: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay() -> u64 {
    200
}

/// `[crawl]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlPoliciesConfig {
    /// What to do when a detail page cannot be fetched.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

/// How the crawl reacts to a failed detail-page fetch.
///
/// A failed listing page always ends the walk; there is no continuation URL to follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Record the error, keep the record without that enrichment, move on.
    #[default]
    Continue,
    /// Stop the walk at the first fetch error.
    FailFast,
}

// ---------------------------------------------------------------------------
// Crawl config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub listing_url: Url,
    pub institution_detail_url: Url,
    pub program_detail_url: Url,
    pub next_page_pattern: String,
    pub timeout_secs: u64,
    pub request_delay_ms: u64,
    pub user_agent: Option<String>,
    pub error_policy: ErrorPolicy,
}

impl CrawlConfig {
    /// Resolve the runtime config, validating every endpoint URL.
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        validate_timeout(config.http.timeout_secs)?;
        Ok(Self {
            listing_url: parse_endpoint("listing_url", &config.source.listing_url)?,
            institution_detail_url: parse_endpoint(
                "institution_detail_url",
                &config.source.institution_detail_url,
            )?,
            program_detail_url: parse_endpoint(
                "program_detail_url",
                &config.source.program_detail_url,
            )?,
            next_page_pattern: config.source.next_page_pattern.clone(),
            timeout_secs: config.http.timeout_secs,
            request_delay_ms: config.http.request_delay_ms,
            user_agent: config.http.user_agent.clone(),
            error_policy: config.crawl.error_policy,
        })
    }

    /// Detail page URL for an institution identifier.
    pub fn institution_url(&self, id: &str) -> Url {
        let mut url = self.institution_detail_url.clone();
        url.query_pairs_mut().append_pair("IDAkrIPTS", id);
        url
    }

    /// Detail page URL for a program's reference number / identifier pair.
    pub fn program_url(&self, reference_number: &str, id: &str) -> Url {
        let mut url = self.program_detail_url.clone();
        url.query_pairs_mut()
            .append_pair("NoRujA", reference_number)
            .append_pair("IdAkrKP", id);
        url
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        // The built-in endpoints are valid absolute URLs.
        Self::from_app(&AppConfig::default()).expect("default endpoints parse")
    }
}

/// Reject a zero per-request timeout.
pub fn validate_timeout(secs: u64) -> Result<()> {
    if secs == 0 {
        return Err(HarvestError::validation("timeout_secs must be greater than zero"));
    }
    Ok(())
}

fn parse_endpoint(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| HarvestError::config(format!("invalid {key} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.qualreg/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HarvestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.qualreg/qualreg.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HarvestError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| HarvestError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HarvestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HarvestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
