//! Tenant: an isolated customer workspace.

use serde::{Deserialize, Serialize};

use tenancy_core::{Entity, TenantId};

use crate::UpdateTenantSettings;

/// A workspace and its public-facing settings.
///
/// `id` and `subdomain` are fixed once the tenant exists (the subdomain is the
/// routing key); uniqueness of the subdomain is the store's job. Unset
/// settings are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    id: TenantId,
    pub name: String,
    subdomain: String,
    #[serde(default)]
    pub invitation: String,
    #[serde(default)]
    pub welcome_message: String,
    #[serde(default)]
    pub cname: String,
}

impl Tenant {
    pub fn new(id: TenantId, name: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            subdomain: subdomain.into(),
            invitation: String::new(),
            welcome_message: String::new(),
            cname: String::new(),
        }
    }

    pub fn id(&self) -> TenantId {
        self.id
    }

    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// Apply a settings update: title becomes the display name.
    pub fn apply_settings(&mut self, settings: &UpdateTenantSettings) {
        self.name = settings.title.clone();
        self.invitation = settings.invitation.clone();
        self.welcome_message = settings.welcome_message.clone();
    }

    pub fn set_cname(&mut self, cname: impl Into<String>) {
        self.cname = cname.into();
    }
}

impl Entity for Tenant {
    type Id = TenantId;

    fn id(&self) -> TenantId {
        self.id
    }
}
