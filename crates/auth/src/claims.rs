//! Token payloads: session claims and OAuth handshake claims.
//!
//! Field identifiers are a wire contract with other services and must not
//! change. Signing lives in [`crate::jwt`]; this module only defines shapes and
//! the time-window check.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tenancy_core::UserId;

use crate::{IdentityError, IdentityResult, ProviderLink, User};

/// Standard token metadata shared by both claim types.
///
/// Timestamps travel as unix seconds (`iat`, `exp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Unique token id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
}

impl StandardClaims {
    /// Window starting at `issued_at` lasting at least `ttl`.
    ///
    /// Both ends are whole seconds: `iat` is truncated and `exp` rounded up, so
    /// the token is valid at the instant it was issued.
    pub fn new(issued_at: DateTime<Utc>, ttl: Duration) -> IdentityResult<Self> {
        if ttl <= Duration::zero() {
            return Err(IdentityError::InvalidTimeWindow);
        }
        let end = issued_at + ttl;
        let mut expires_at = end.trunc_subsecs(0);
        if expires_at < end {
            expires_at += Duration::seconds(1);
        }
        Ok(Self {
            iss: None,
            sub: None,
            jti: None,
            issued_at: issued_at.trunc_subsecs(0),
            expires_at,
        })
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.sub = Some(subject.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.jti = Some(id.into());
        self
    }
}

/// Deterministically validate a claims time window.
///
/// Signature verification is not done here.
pub fn validate_claims(claims: &StandardClaims, now: DateTime<Utc>) -> IdentityResult<()> {
    if claims.expires_at <= claims.issued_at {
        return Err(IdentityError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(IdentityError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(IdentityError::ExpiredClaims);
    }
    Ok(())
}

/// Common access to the metadata of any token payload.
pub trait Claims: Serialize + DeserializeOwned {
    fn standard(&self) -> &StandardClaims;

    fn validate(&self, now: DateTime<Utc>) -> IdentityResult<()> {
        validate_claims(self.standard(), now)
    }
}

/// Session token payload for an authenticated, registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "user/id")]
    pub user_id: UserId,

    #[serde(rename = "user/name")]
    pub user_name: String,

    #[serde(rename = "user/email")]
    pub user_email: String,

    #[serde(flatten)]
    pub standard: StandardClaims,
}

impl SessionClaims {
    /// Claims for an already-authenticated user, valid for `ttl` from `issued_at`.
    pub fn for_user(user: &User, issued_at: DateTime<Utc>, ttl: Duration) -> IdentityResult<Self> {
        let standard = StandardClaims::new(issued_at, ttl)?.with_subject(user.id.to_string());
        Ok(Self {
            user_id: user.id,
            user_name: user.name.clone(),
            user_email: user.email.clone(),
            standard,
        })
    }
}

impl Claims for SessionClaims {
    fn standard(&self) -> &StandardClaims {
        &self.standard
    }
}

/// Identity asserted by an external provider at the end of a login redirect.
///
/// Untrusted until it has round-tripped through a signed [`OAuthClaims`] token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthIdentity {
    pub id: String,
    pub provider: String,
    pub name: String,
    pub email: String,
}

/// Short-lived payload bridging a redirect-based login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthClaims {
    #[serde(rename = "oauth/id")]
    pub oauth_id: String,

    #[serde(rename = "oauth/provider")]
    pub oauth_provider: String,

    #[serde(rename = "oauth/name")]
    pub oauth_name: String,

    #[serde(rename = "oauth/email")]
    pub oauth_email: String,

    #[serde(flatten)]
    pub standard: StandardClaims,
}

impl OAuthClaims {
    pub fn new(identity: &OAuthIdentity, issued_at: DateTime<Utc>, ttl: Duration) -> IdentityResult<Self> {
        let standard = StandardClaims::new(issued_at, ttl)?.with_subject(identity.id.clone());
        Ok(Self {
            oauth_id: identity.id.clone(),
            oauth_provider: identity.provider.clone(),
            oauth_name: identity.name.clone(),
            oauth_email: identity.email.clone(),
            standard,
        })
    }

    /// The provider link this login establishes.
    pub fn provider_link(&self) -> ProviderLink {
        ProviderLink::new(self.oauth_provider.clone(), self.oauth_id.clone())
    }
}

impl Claims for OAuthClaims {
    fn standard(&self) -> &StandardClaims {
        &self.standard
    }
}
