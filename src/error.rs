//! Error types for the extraction engine
//!
//! None of these escape the public pipelines: each pipeline maps an `Err`
//! to its fallback result and logs it.

use thiserror::Error;

/// Result alias used by the extraction internals.
pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// A CSS selector used to walk the document failed to compile.
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// A component-source matcher pattern failed to compile.
    #[error("invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),
}
