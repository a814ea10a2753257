//! Persistence collaborator for tenants and users.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tenancy_auth::{
    IdentityError, IdentityResult, ProviderLink, Role, Tenant, UpdateTenantSettings, User,
};
use tenancy_core::{DomainError, TenantId, UserId};

/// A user to be registered; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub providers: Vec<ProviderLink>,
}

/// Atomic create/read/update for tenants and users.
///
/// Implementations must make each uniqueness check and its write a single
/// atomic step: subdomains are unique across tenants, a user holds at most one
/// link per provider, and an external identity (provider, uid) belongs to at
/// most one user per tenant.
pub trait IdentityStore: Send + Sync {
    /// Fails with `TenantSubdomainConflict` when the subdomain is taken.
    fn create_tenant(&self, name: &str, subdomain: &str) -> IdentityResult<Tenant>;
    /// Creates the tenant and its first user together, or neither.
    fn create_tenant_with_founder(
        &self,
        name: &str,
        subdomain: &str,
        founder: NewUser,
    ) -> IdentityResult<(Tenant, User)>;
    fn get_tenant(&self, tenant_id: TenantId) -> IdentityResult<Tenant>;
    fn get_tenant_by_subdomain(&self, subdomain: &str) -> IdentityResult<Option<Tenant>>;
    /// Writes title, invitation and welcome message only.
    fn update_tenant_settings(
        &self,
        tenant_id: TenantId,
        settings: &UpdateTenantSettings,
    ) -> IdentityResult<Tenant>;
    fn set_tenant_cname(&self, tenant_id: TenantId, cname: &str) -> IdentityResult<Tenant>;

    fn create_user(&self, tenant_id: TenantId, user: NewUser) -> IdentityResult<User>;
    fn get_user(&self, user_id: UserId) -> IdentityResult<User>;
    fn find_user_by_provider(
        &self,
        tenant_id: TenantId,
        provider: &str,
        uid: &str,
    ) -> IdentityResult<Option<User>>;
    fn find_user_by_email(&self, tenant_id: TenantId, email: &str) -> IdentityResult<Option<User>>;
    /// Fails with `DuplicateProvider` when the user already has that provider,
    /// and with a conflict when another user of the tenant holds the identity.
    fn add_provider(&self, user_id: UserId, link: ProviderLink) -> IdentityResult<User>;
    fn set_role(&self, user_id: UserId, role: Role) -> IdentityResult<User>;
}

impl<S> IdentityStore for Arc<S>
where
    S: IdentityStore + ?Sized,
{
    fn create_tenant(&self, name: &str, subdomain: &str) -> IdentityResult<Tenant> {
        (**self).create_tenant(name, subdomain)
    }

    fn create_tenant_with_founder(
        &self,
        name: &str,
        subdomain: &str,
        founder: NewUser,
    ) -> IdentityResult<(Tenant, User)> {
        (**self).create_tenant_with_founder(name, subdomain, founder)
    }

    fn get_tenant(&self, tenant_id: TenantId) -> IdentityResult<Tenant> {
        (**self).get_tenant(tenant_id)
    }

    fn get_tenant_by_subdomain(&self, subdomain: &str) -> IdentityResult<Option<Tenant>> {
        (**self).get_tenant_by_subdomain(subdomain)
    }

    fn update_tenant_settings(
        &self,
        tenant_id: TenantId,
        settings: &UpdateTenantSettings,
    ) -> IdentityResult<Tenant> {
        (**self).update_tenant_settings(tenant_id, settings)
    }

    fn set_tenant_cname(&self, tenant_id: TenantId, cname: &str) -> IdentityResult<Tenant> {
        (**self).set_tenant_cname(tenant_id, cname)
    }

    fn create_user(&self, tenant_id: TenantId, user: NewUser) -> IdentityResult<User> {
        (**self).create_user(tenant_id, user)
    }

    fn get_user(&self, user_id: UserId) -> IdentityResult<User> {
        (**self).get_user(user_id)
    }

    fn find_user_by_provider(
        &self,
        tenant_id: TenantId,
        provider: &str,
        uid: &str,
    ) -> IdentityResult<Option<User>> {
        (**self).find_user_by_provider(tenant_id, provider, uid)
    }

    fn find_user_by_email(&self, tenant_id: TenantId, email: &str) -> IdentityResult<Option<User>> {
        (**self).find_user_by_email(tenant_id, email)
    }

    fn add_provider(&self, user_id: UserId, link: ProviderLink) -> IdentityResult<User> {
        (**self).add_provider(user_id, link)
    }

    fn set_role(&self, user_id: UserId, role: Role) -> IdentityResult<User> {
        (**self).set_role(user_id, role)
    }
}

#[derive(Debug, Default)]
struct State {
    last_tenant_id: i64,
    last_user_id: i64,
    tenants: HashMap<TenantId, Tenant>,
    subdomains: HashMap<String, TenantId>,
    users: HashMap<UserId, User>,
}

impl State {
    fn tenant_mut(&mut self, tenant_id: TenantId) -> IdentityResult<&mut Tenant> {
        self.tenants.get_mut(&tenant_id).ok_or(IdentityError::TenantNotFound)
    }

    fn user_mut(&mut self, user_id: UserId) -> IdentityResult<&mut User> {
        self.users.get_mut(&user_id).ok_or(IdentityError::UserNotFound)
    }

    /// Reject `link` when a user other than `holder` already owns it in the tenant.
    fn ensure_identity_free(
        &self,
        tenant_id: TenantId,
        link: &ProviderLink,
        holder: Option<UserId>,
    ) -> IdentityResult<()> {
        let taken = self.users.values().any(|u| {
            Some(u.id) != holder
                && u.tenant_id() == tenant_id
                && u.provider_uid(&link.name) == Some(link.uid.as_str())
        });
        if taken {
            return Err(DomainError::conflict(format!(
                "{} identity already registered in tenant",
                link.name
            ))
            .into());
        }
        Ok(())
    }

    // Checks only; nothing is written until `insert_*`.
    fn build_tenant(&self, name: &str, subdomain: &str) -> IdentityResult<Tenant> {
        if self.subdomains.contains_key(subdomain) {
            return Err(IdentityError::subdomain_conflict(subdomain));
        }
        Ok(Tenant::new(TenantId::new(self.last_tenant_id + 1), name, subdomain))
    }

    fn build_user(&self, tenant_id: TenantId, new_user: NewUser) -> IdentityResult<User> {
        for link in &new_user.providers {
            self.ensure_identity_free(tenant_id, link, None)?;
        }

        let mut user = User::new(
            UserId::new(self.last_user_id + 1),
            tenant_id,
            new_user.name,
            new_user.email,
            new_user.role,
        );
        for link in new_user.providers {
            user.add_provider(link)?;
        }
        Ok(user)
    }

    fn insert_tenant(&mut self, tenant: Tenant) -> Tenant {
        self.last_tenant_id = tenant.id().get();
        self.subdomains.insert(tenant.subdomain().to_string(), tenant.id());
        self.tenants.insert(tenant.id(), tenant.clone());
        tenant
    }

    fn insert_user(&mut self, user: User) -> User {
        self.last_user_id = user.id.get();
        self.users.insert(user.id, user.clone());
        user
    }
}

/// In-memory store for tests/dev.
///
/// A single lock guards all maps, so every check-then-write runs under one
/// write guard.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    inner: RwLock<State>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> IdentityResult<RwLockReadGuard<'_, State>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> IdentityResult<RwLockWriteGuard<'_, State>> {
        self.inner.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> IdentityError {
    DomainError::invariant("identity store lock poisoned").into()
}

impl IdentityStore for InMemoryIdentityStore {
    fn create_tenant(&self, name: &str, subdomain: &str) -> IdentityResult<Tenant> {
        let mut state = self.write()?;
        let tenant = state.build_tenant(name, subdomain)?;
        Ok(state.insert_tenant(tenant))
    }

    fn create_tenant_with_founder(
        &self,
        name: &str,
        subdomain: &str,
        founder: NewUser,
    ) -> IdentityResult<(Tenant, User)> {
        let mut state = self.write()?;
        let tenant = state.build_tenant(name, subdomain)?;
        let founder = state.build_user(tenant.id(), founder)?;

        let tenant = state.insert_tenant(tenant);
        let founder = state.insert_user(founder);
        Ok((tenant, founder))
    }

    fn get_tenant(&self, tenant_id: TenantId) -> IdentityResult<Tenant> {
        self.read()?
            .tenants
            .get(&tenant_id)
            .cloned()
            .ok_or(IdentityError::TenantNotFound)
    }

    fn get_tenant_by_subdomain(&self, subdomain: &str) -> IdentityResult<Option<Tenant>> {
        let state = self.read()?;
        Ok(state
            .subdomains
            .get(subdomain)
            .and_then(|id| state.tenants.get(id))
            .cloned())
    }

    fn update_tenant_settings(
        &self,
        tenant_id: TenantId,
        settings: &UpdateTenantSettings,
    ) -> IdentityResult<Tenant> {
        let mut state = self.write()?;
        let tenant = state.tenant_mut(tenant_id)?;
        tenant.apply_settings(settings);
        Ok(tenant.clone())
    }

    fn set_tenant_cname(&self, tenant_id: TenantId, cname: &str) -> IdentityResult<Tenant> {
        let mut state = self.write()?;
        let tenant = state.tenant_mut(tenant_id)?;
        tenant.set_cname(cname);
        Ok(tenant.clone())
    }

    fn create_user(&self, tenant_id: TenantId, new_user: NewUser) -> IdentityResult<User> {
        let mut state = self.write()?;
        if !state.tenants.contains_key(&tenant_id) {
            return Err(IdentityError::TenantNotFound);
        }
        let user = state.build_user(tenant_id, new_user)?;
        Ok(state.insert_user(user))
    }

    fn get_user(&self, user_id: UserId) -> IdentityResult<User> {
        self.read()?
            .users
            .get(&user_id)
            .cloned()
            .ok_or(IdentityError::UserNotFound)
    }

    fn find_user_by_provider(
        &self,
        tenant_id: TenantId,
        provider: &str,
        uid: &str,
    ) -> IdentityResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.tenant_id() == tenant_id && u.provider_uid(provider) == Some(uid))
            .cloned())
    }

    fn find_user_by_email(&self, tenant_id: TenantId, email: &str) -> IdentityResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.tenant_id() == tenant_id && !u.email.is_empty() && u.email == email)
            .cloned())
    }

    fn add_provider(&self, user_id: UserId, link: ProviderLink) -> IdentityResult<User> {
        let mut state = self.write()?;
        let tenant_id = state.user_mut(user_id)?.tenant_id();
        state.ensure_identity_free(tenant_id, &link, Some(user_id))?;

        let user = state.user_mut(user_id)?;
        user.add_provider(link)?;
        Ok(user.clone())
    }

    fn set_role(&self, user_id: UserId, role: Role) -> IdentityResult<User> {
        let mut state = self.write()?;
        let user = state.user_mut(user_id)?;
        user.set_role(role);
        Ok(user.clone())
    }
}
