//! Error types for engine construction.
//!
//! Runtime degeneracies (coincident centers, zero denominators) are skipped
//! silently by the pipeline and never surface here.

use thiserror::Error;

/// Errors raised before any simulation runs.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum PhysicsError {
    /// A configuration value is out of range or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PhysicsError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}

/// Result alias for fallible construction.
pub type Result<T> = std::result::Result<T, PhysicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PhysicsError::invalid("capacity must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration: capacity must be at least 1"
        );
    }
}
