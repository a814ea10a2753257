//! Token issuance configuration.

use chrono::Duration;

use crate::{IdentityError, IdentityResult};

const DEV_SECRET: &str = "dev-secret";

/// Signing secret, issuer and token lifetimes.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    /// `iss` claim; verification rejects tokens from any other issuer.
    pub issuer: String,
    pub session_ttl: Duration,
    /// Handshake window; must be strictly shorter than `session_ttl`.
    pub oauth_ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: "tenancy".to_string(),
            session_ttl: Duration::days(365),
            oauth_ttl: Duration::minutes(10),
        }
    }

    /// Read `JWT_SECRET`, `JWT_ISSUER`, `SESSION_TTL_SECS` and `OAUTH_TTL_SECS`.
    pub fn from_env() -> IdentityResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TokenConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> IdentityResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_SECRET.to_string()
        });

        let mut config = Self::new(secret);
        if let Some(issuer) = lookup("JWT_ISSUER") {
            config.issuer = issuer;
        }
        if let Some(secs) = parse_secs(&lookup, "SESSION_TTL_SECS")? {
            config.session_ttl = Duration::seconds(secs);
        }
        if let Some(secs) = parse_secs(&lookup, "OAUTH_TTL_SECS")? {
            config.oauth_ttl = Duration::seconds(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Lifetimes are whole seconds on the wire, so each must be at least one
    /// second and the handshake at least one second shorter than the session.
    pub fn validate(&self) -> IdentityResult<()> {
        let second = Duration::seconds(1);
        if self.secret.is_empty() {
            return Err(IdentityError::config("signing secret cannot be empty"));
        }
        if self.oauth_ttl < second || self.session_ttl < second {
            return Err(IdentityError::config("token lifetimes must be at least one second"));
        }
        if self.oauth_ttl + second > self.session_ttl {
            return Err(IdentityError::config(
                "oauth handshake lifetime must be shorter than session lifetime",
            ));
        }
        Ok(())
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("session_ttl", &self.session_ttl)
            .field("oauth_ttl", &self.oauth_ttl)
            .finish()
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> IdentityResult<Option<i64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|e| IdentityError::config(format!("{key}: {e}")))
        })
        .transpose()
}
