//! HTML extraction for the qualifications register.
//!
//! This crate provides:
//! - [`table`]: attribute-fingerprint table lookup
//! - [`row`]: cell text and `label : value` helpers
//! - [`listing`]: institution listing pages and pagination
//! - [`institution`]: institution contact block and program summaries
//! - [`program`]: program detail, durations and study schedule
//!
//! Every parser takes an already-parsed [`scraper::Html`] and never fails: a
//! section that cannot be located leaves the corresponding fields untouched.

pub mod institution;
pub mod listing;
pub mod program;
pub mod row;
pub mod table;

pub use institution::parse_institution;
pub use listing::{DEFAULT_NEXT_PAGE_PATTERN, ListingPage, parse_listing, split_former_name};
pub use program::{former_qualification_name, parse_program_details};
pub use table::{Fingerprint, locate};
