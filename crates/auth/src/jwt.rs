//! HS256 token issuer/verifier for session and OAuth claims.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    Claims, IdentityError, IdentityResult, OAuthClaims, OAuthIdentity, SessionClaims, TokenConfig,
    User,
};

/// Validates a session token presented by a request.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> IdentityResult<SessionClaims>;
}

/// Signs and verifies compact HS256 tokens.
///
/// Signature and issuer are checked by `jsonwebtoken`; the time window is
/// checked against the caller-supplied `now`.
pub struct Hs256TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    config: TokenConfig,
}

impl Hs256TokenIssuer {
    pub fn new(config: TokenConfig) -> IdentityResult<Self> {
        config.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);
        validation.set_issuer(&[config.issuer.as_str()]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn session_claims(&self, user: &User, now: DateTime<Utc>) -> IdentityResult<SessionClaims> {
        let mut claims = SessionClaims::for_user(user, now, self.config.session_ttl)?;
        claims.standard = claims
            .standard
            .with_issuer(self.config.issuer.clone())
            .with_id(Uuid::now_v7().to_string());
        Ok(claims)
    }

    pub fn oauth_claims(&self, identity: &OAuthIdentity, now: DateTime<Utc>) -> IdentityResult<OAuthClaims> {
        let mut claims = OAuthClaims::new(identity, now, self.config.oauth_ttl)?;
        claims.standard = claims
            .standard
            .with_issuer(self.config.issuer.clone())
            .with_id(Uuid::now_v7().to_string());
        Ok(claims)
    }

    pub fn issue_session(&self, user: &User, now: DateTime<Utc>) -> IdentityResult<String> {
        let claims = self.session_claims(user, now)?;
        let token = self.encode(&claims)?;
        tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id(), "session token issued");
        Ok(token)
    }

    pub fn issue_oauth(&self, identity: &OAuthIdentity, now: DateTime<Utc>) -> IdentityResult<String> {
        let claims = self.oauth_claims(identity, now)?;
        let token = self.encode(&claims)?;
        tracing::debug!(provider = %identity.provider, "oauth handshake token issued");
        Ok(token)
    }

    pub fn verify_session(&self, token: &str, now: DateTime<Utc>) -> IdentityResult<SessionClaims> {
        self.decode(token, now)
    }

    pub fn verify_oauth(&self, token: &str, now: DateTime<Utc>) -> IdentityResult<OAuthClaims> {
        self.decode(token, now)
    }

    pub fn encode<C: Claims>(&self, claims: &C) -> IdentityResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))
    }

    fn decode<C: Claims>(&self, token: &str, now: DateTime<Utc>) -> IdentityResult<C> {
        let claims = jsonwebtoken::decode::<C>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(error = %e, "token rejected");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::ExpiredClaims,
                    _ => IdentityError::InvalidToken(e.to_string()),
                }
            })?;

        if let Err(e) = claims.validate(now) {
            tracing::warn!(error = %e, "token rejected");
            return Err(e);
        }
        Ok(claims)
    }
}

impl JwtValidator for Hs256TokenIssuer {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> IdentityResult<SessionClaims> {
        self.verify_session(token, now)
    }
}

impl core::fmt::Debug for Hs256TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256TokenIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
