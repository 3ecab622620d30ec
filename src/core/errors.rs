/*!
# Error System

Two error families are used by the analyzer:

- [`PlatformError`] - graceful-degradation errors produced while reading
  platform attributes. They are reported as diagnostics against the
  attribute declaration and never abort analysis.
- [`AnalysisError`] - errors that escape a single body walk or the input
  loading layer (cancellation, malformed configuration, I/O).
*/

use thiserror::Error;

/// Problems found while normalising a platform attribute string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("The platform '{0}' is not a known platform name")]
    UnknownPlatform(String),

    #[error("Version '{version}' is not valid for platform '{platform}'. Use a version with {expected} for this platform")]
    InvalidVersionArity {
        platform: String,
        version: String,
        expected: String,
    },

    #[error("Version '{version}' of platform '{platform}' could not be parsed")]
    NotParseableVersion { platform: String, version: String },
}

impl PlatformError {
    /// Returns true for the version-related variants.
    pub fn is_version_error(&self) -> bool {
        !matches!(self, PlatformError::UnknownPlatform(_))
    }
}

/// Errors escaping an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis was cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed compilation input: {0}")]
    Json(#[from] serde_json::Error),
}
