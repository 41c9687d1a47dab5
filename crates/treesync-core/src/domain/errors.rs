//! Domain error types
//!
//! Validation failures for paths, identifiers, destination lists and
//! exclude patterns.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid storage path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid remote task identifier
    #[error("Invalid task ID: {0}")]
    InvalidTaskId(String),

    /// A destination list that yields no usable destination
    #[error("Invalid destination list: {0}")]
    InvalidDestinations(String),

    /// An exclude pattern that cannot be compiled into a matcher
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern {
        /// The offending pattern as written by the user
        pattern: String,
        /// Why compilation failed
        reason: String,
    },

    /// A destination that equals, contains or lies inside the source
    #[error("Destination {destination} overlaps source {source_path}")]
    OverlappingPaths {
        source_path: String,
        destination: String,
    },

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidPath("a/../b".to_string());
        assert_eq!(err.to_string(), "Invalid path: a/../b");

        let err = DomainError::InvalidExcludePattern {
            pattern: "[".to_string(),
            reason: "unclosed character class".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid exclude pattern '[': unclosed character class"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidTaskId(String::new());
        let err2 = DomainError::InvalidTaskId(String::new());
        let err3 = DomainError::InvalidTaskId("x".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
