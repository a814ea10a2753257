//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures (validation, invariants,
/// conflicts). Token and storage concerns map onto it at their own boundaries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. blank tenant name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A uniqueness or concurrency conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Reject blank (empty or whitespace-only) input for the named field.
    pub fn ensure_not_blank(field: &str, value: &str) -> DomainResult<()> {
        if value.trim().is_empty() {
            return Err(Self::validation(format!("{field} cannot be empty")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        let err = DomainError::ensure_not_blank("subdomain", "   ").unwrap_err();
        assert_eq!(err.to_string(), "validation failed: subdomain cannot be empty");
        assert!(DomainError::ensure_not_blank("subdomain", "acme").is_ok());
    }
}
