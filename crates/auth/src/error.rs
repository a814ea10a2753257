//! Identity error taxonomy.

use thiserror::Error;

use tenancy_core::DomainError;

use crate::Role;

/// Result type used across the identity layer.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Failures surfaced by identity operations.
///
/// Every variant is per-request and recoverable: callers map them onto
/// user-facing messages ("this subdomain is taken", ...).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("provider '{provider}' is already linked to this user")]
    DuplicateProvider { provider: String },

    #[error("invalid role level {0} (expected 1, 2 or 3)")]
    InvalidRole(i32),

    #[error("claims have expired")]
    ExpiredClaims,

    #[error("claims not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid claims time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("subdomain '{subdomain}' is already taken")]
    TenantSubdomainConflict { subdomain: String },

    #[error("forbidden: requires {required}, user is {actual}")]
    Forbidden { required: Role, actual: Role },

    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("tenant not found")]
    TenantNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl IdentityError {
    pub fn duplicate_provider(provider: impl Into<String>) -> Self {
        Self::DuplicateProvider {
            provider: provider.into(),
        }
    }

    pub fn subdomain_conflict(subdomain: impl Into<String>) -> Self {
        Self::TenantSubdomainConflict {
            subdomain: subdomain.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for rejections caused by the token itself (bad signature, expired,
    /// not yet valid). Request layers answer these with 401.
    pub fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            Self::ExpiredClaims | Self::NotYetValid | Self::InvalidTimeWindow | Self::InvalidToken(_)
        )
    }
}
