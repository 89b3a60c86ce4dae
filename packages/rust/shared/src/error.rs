//! Error types for qualreg.
//!
//! Library crates use [`HarvestError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all qualreg operations.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport, HTTP status, or timeout failure while fetching a page.
    #[error("fetch error at {url}: {message}")]
    Fetch { url: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A setting or flag value outside its allowed range.
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HarvestError>;

impl HarvestError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch error for the given URL.
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from the network layer.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = HarvestError::config("listing_url is empty");
        assert_eq!(err.to_string(), "config error: listing_url is empty");

        let err = HarvestError::fetch("https://example.com/a", "HTTP 503");
        assert_eq!(err.to_string(), "fetch error at https://example.com/a: HTTP 503");
        assert!(err.is_fetch());
    }

    #[test]
    fn non_fetch_errors_are_not_fetch() {
        assert!(!HarvestError::config("bad url").is_fetch());
        let err = HarvestError::validation("timeout_secs must be greater than zero");
        assert!(!err.is_fetch());
        assert_eq!(err.to_string(), "validation error: timeout_secs must be greater than zero");
    }
}
