//! Custom error types for Tandem
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for Tandem operations
#[derive(Error, Debug)]
pub enum TandemError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Budget-related errors
    #[error("Budget error: {0}")]
    Budget(String),

    /// A propagation step failed; the remaining steps were not run
    #[error("Propagation into {target} failed at step {step}: {reason}")]
    Propagation {
        step: u8,
        target: String,
        reason: String,
    },

    /// The source period of a copy has no budget rows
    #[error("Nothing to copy: {0} has no budgets")]
    NothingToCopy(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TandemError {
    /// Create a "not found" error for sectors
    pub fn sector_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Sector",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came out of a propagation step
    pub fn is_propagation(&self) -> bool {
        matches!(self, Self::Propagation { .. })
    }
}

impl From<std::io::Error> for TandemError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TandemError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Tandem operations
pub type TandemResult<T> = Result<T, TandemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TandemError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = TandemError::sector_not_found("Home");
        assert_eq!(err.to_string(), "Sector not found: Home");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_propagation_error_keeps_reason_verbatim() {
        let err = TandemError::Propagation {
            step: 2,
            target: "2025-02".into(),
            reason: "Storage error: disk full".into(),
        };
        assert_eq!(
            err.to_string(),
            "Propagation into 2025-02 failed at step 2: Storage error: disk full"
        );
        assert!(err.is_propagation());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TandemError = io_err.into();
        assert!(matches!(err, TandemError::Io(_)));
    }
}
