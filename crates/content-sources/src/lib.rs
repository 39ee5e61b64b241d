// FILE: crates/content-sources/src/lib.rs

mod quran_api;
mod static_content;
mod wire;

pub use quran_api::{QuranApi, DEFAULT_API_BASE, DEFAULT_AUDIO_BASE, DEFAULT_TRANSLATION};
pub use static_content::StaticContent;
use std::fmt;
use tilawah_core::ContentError;

/// Result type for content source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from content sources
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Network error
    NetworkError(String),
    /// Parse error
    ParseError(String),
    /// Not found
    NotFound(String),
    /// Invalid query
    InvalidQuery(String),
    /// Source unavailable
    Unavailable(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NetworkError(e) => write!(f, "Network error: {}", e),
            SourceError::ParseError(e) => write!(f, "Parse error: {}", e),
            SourceError::NotFound(what) => write!(f, "Not found: {}", what),
            SourceError::InvalidQuery(e) => write!(f, "Invalid query: {}", e),
            SourceError::Unavailable(e) => write!(f, "Source unavailable: {}", e),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<SourceError> for ContentError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(what) => ContentError::NotFound { what },
            SourceError::InvalidQuery(query) => ContentError::NotFound { what: query },
            other => ContentError::Unavailable {
                reason: other.to_string(),
            },
        }
    }
}
