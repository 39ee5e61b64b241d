//! Error types shared by the Tilawah crates
//!
//! Two families live here:
//! - [`CoreError`]: rejected domain values (positions outside the collection)
//! - [`ContentError`]: failures reported by a [`crate::ContentProvider`]
//!
//! Each error carries a [`ErrorSeverity`] so front ends can decide whether to
//! offer a retry, degrade a feature, or just report the problem.

use std::fmt;
use thiserror::Error;

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for content lookups
pub type ContentResult<T> = Result<T, ContentError>;

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// The operation can be attempted again (network hiccup, etc.)
    Recoverable,
    /// The request itself was wrong and will fail the same way again
    Rejected,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Errors raised while constructing domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Chapter number outside 1..=114
    #[error("Invalid chapter: {chapter} (must be between 1 and {max})")]
    InvalidChapter { chapter: u32, max: u16 },

    /// Verse number zero or not representable
    #[error("Invalid verse: {verse} in chapter {chapter}")]
    InvalidVerse { chapter: u32, verse: u32 },

    /// Verse beyond the end of its chapter
    #[error("Verse {verse} is past the end of chapter {chapter} ({count} verses)")]
    VerseOutOfRange { chapter: u16, verse: u16, count: u16 },

    /// A textual position could not be parsed
    #[error("Cannot parse position '{input}': expected CHAPTER:VERSE")]
    MalformedPosition { input: String },
}

impl CoreError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Rejected
    }
}

/// Errors reported by content providers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Requested chapter or verse does not exist upstream
    #[error("Content not found: {what}")]
    NotFound { what: String },

    /// The provider could not be reached or answered with garbage
    #[error("Content source unavailable: {reason}")]
    Unavailable { reason: String },
}

impl ContentError {
    /// Creates a `NotFound` error for a chapter
    pub fn chapter_not_found(chapter: u32) -> Self {
        Self::NotFound {
            what: format!("chapter {}", chapter),
        }
    }

    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound { .. } => ErrorSeverity::Rejected,
            Self::Unavailable { .. } => ErrorSeverity::Recoverable,
        }
    }

    /// Returns true if retrying later could succeed
    pub fn is_recoverable(&self) -> bool {
        self.severity() == ErrorSeverity::Recoverable
    }
}

impl From<CoreError> for ContentError {
    fn from(err: CoreError) -> Self {
        Self::NotFound {
            what: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_chapter_display() {
        let err = CoreError::InvalidChapter { chapter: 115, max: 114 };
        let msg = err.to_string();
        assert!(msg.contains("115"));
        assert!(msg.contains("114"));
    }

    #[test]
    fn test_core_errors_are_rejected() {
        let err = CoreError::InvalidVerse { chapter: 1, verse: 0 };
        assert_eq!(err.severity(), ErrorSeverity::Rejected);
    }

    #[test]
    fn test_content_error_severity() {
        assert!(!ContentError::chapter_not_found(200).is_recoverable());
        let err = ContentError::Unavailable {
            reason: "timeout".to_string(),
        };
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_core_error_converts_to_not_found() {
        let err: ContentError = CoreError::VerseOutOfRange {
            chapter: 1,
            verse: 8,
            count: 7,
        }
        .into();
        assert!(matches!(err, ContentError::NotFound { .. }));
        assert!(err.to_string().contains("chapter 1"));
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(ErrorSeverity::Recoverable.to_string(), "Recoverable");
        assert_eq!(ErrorSeverity::Rejected.to_string(), "Rejected");
    }
}
