//! Request payloads for tenant creation and tenant settings update.
//!
//! Embedded OAuth claims are never read from the request body: the request
//! layer attaches them after verifying the handshake token.

use serde::{Deserialize, Serialize};

use crate::OAuthClaims;

/// Input used to create a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTenant {
    /// Single-use correlation token; consumed by an external store.
    pub token: String,
    pub name: String,
    pub subdomain: String,
    #[serde(skip)]
    pub user_claims: Option<OAuthClaims>,
}

impl CreateTenant {
    pub fn new(token: impl Into<String>, name: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            name: name.into(),
            subdomain: subdomain.into(),
            user_claims: None,
        }
    }

    pub fn with_user_claims(mut self, claims: OAuthClaims) -> Self {
        self.user_claims = Some(claims);
        self
    }
}

/// Input used to update tenant settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantSettings {
    pub title: String,
    #[serde(default)]
    pub invitation: String,
    #[serde(default)]
    pub welcome_message: String,
    #[serde(skip)]
    pub user_claims: Option<OAuthClaims>,
}
