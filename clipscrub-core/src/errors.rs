//! errors.rs - Custom error types for the clipscrub-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `clipscrub-core` library.
///
/// Rejected mutations (out-of-range index, duplicate or empty site) are not
/// errors; see [`crate::store::MutationOutcome`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ClipscrubError {
    /// No usable rule set: nothing persisted and the bundled defaults could
    /// not be fetched, or a stored document failed schema validation.
    #[error("Rule configuration unavailable: {0}")]
    ConfigMissing(String),

    #[error("Rule #{index} has an invalid pattern '{pattern}': {source}")]
    RulePatternInvalid {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Fields are the rule index, the pattern length and the maximum length.
    #[error("Rule #{0}: pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(usize, usize, usize),

    #[error("Rule #{0} has an empty pattern")]
    EmptyPattern(usize),

    #[error("Persistence layer failure: {0}")]
    Storage(String),

    #[error("Failed to (de)serialize rule document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),
}

/// Convenience alias used across the core crate.
pub type Result<T> = std::result::Result<T, ClipscrubError>;
