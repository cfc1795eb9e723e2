//! Error types for the moviesmod resolver
//!
//! Provides the error enum shared by every stage of the pipeline, with
//! human-readable messages and string serialization for embedders.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error type for all moviesmod resolver operations
///
/// Hop and gateway failures are normally absorbed into empty branch
/// results; these variants surface only at stage boundaries where a
/// caller can act on them.
#[derive(Error, Debug)]
pub enum MoviesModError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse HTML content
    #[error("Failed to parse HTML: {0}")]
    Parse(String),

    /// Expected HTML element was not found
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No content matched the requested title
    #[error("Not found: {0}")]
    NotFound(String),

    /// Metadata lookup failed
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Invalid media identifier provided
    #[error("Invalid media ID: {0}")]
    InvalidId(String),
}

impl Serialize for MoviesModError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for moviesmod resolver operations
pub type Result<T> = std::result::Result<T, MoviesModError>;
