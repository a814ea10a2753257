//! User: a principal bound to exactly one tenant.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;

use tenancy_core::{Entity, TenantId, UserId};

use crate::{IdentityError, IdentityResult, ProviderLink, Role};

/// A user inside one tenant.
///
/// # Invariants
/// - `tenant_id` never changes; the tenant itself is resolved through the store.
/// - At most one provider link per provider name (links are keyed by name).
///
/// Only `id`, `name`, `gravatar` and `role` are serialized: email, tenant and
/// provider links never reach untrusted output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(skip)]
    pub email: String,
    pub gravatar: String,
    #[serde(skip)]
    tenant_id: TenantId,
    pub role: Role,
    #[serde(skip)]
    providers: BTreeMap<String, ProviderLink>,
}

impl User {
    pub fn new(
        id: UserId,
        tenant_id: TenantId,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            gravatar: String::new(),
            tenant_id,
            role,
            providers: BTreeMap::new(),
        }
    }

    pub fn with_gravatar(mut self, gravatar: impl Into<String>) -> Self {
        self.gravatar = gravatar.into();
        self
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// True if the user registered with `provider` (exact, case-sensitive).
    pub fn has_provider(&self, provider: &str) -> bool {
        self.providers.contains_key(provider)
    }

    pub fn provider_uid(&self, provider: &str) -> Option<&str> {
        self.providers.get(provider).map(|link| link.uid.as_str())
    }

    /// Links, ordered by provider name.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderLink> {
        self.providers.values()
    }

    /// Append a provider link; a second link for the same provider is rejected.
    pub fn add_provider(&mut self, link: ProviderLink) -> IdentityResult<()> {
        match self.providers.entry(link.name.clone()) {
            Entry::Occupied(_) => Err(IdentityError::duplicate_provider(link.name)),
            Entry::Vacant(slot) => {
                slot.insert(link);
                Ok(())
            }
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}
