//! Shared types, error model, and configuration for qualreg.
//!
//! This crate is the foundation depended on by all other qualreg crates.
//! It provides:
//! - [`HarvestError`]: the unified error type
//! - Record types ([`Institution`], [`Program`], [`ProgramDetails`], row types)
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, CrawlPoliciesConfig, ErrorPolicy, HttpConfig, SourceConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_timeout,
};
pub use error::{HarvestError, Result};
pub use types::{Contact, DurationRow, Institution, Program, ProgramDetails, StudyScheduleRow};
