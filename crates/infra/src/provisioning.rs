//! Login/provisioning flow on top of an [`IdentityStore`].
//!
//! `no identity -> oauth claims (short-lived) -> tenant created / user linked
//! -> session claims`. Every operation validates the presented claims window
//! and authorizes the actor before touching the store.

use chrono::{DateTime, Utc};

use tenancy_auth::{
    Claims, CreateTenant, IdentityResult, OAuthClaims, Role, Tenant, UpdateTenantSettings, User,
    authorize, require_role, require_tenant,
};
use tenancy_core::{DomainError, TenantId, UserId};

use crate::store::{IdentityStore, NewUser};

/// Roles granted by the provisioning flow.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ProvisioningPolicy {
    /// Role of the user who creates a tenant.
    pub founder_role: Role,
    /// Role of users who join an existing tenant through a login.
    pub newcomer_role: Role,
}

impl Default for ProvisioningPolicy {
    fn default() -> Self {
        Self {
            founder_role: Role::Administrator,
            newcomer_role: Role::Visitor,
        }
    }
}

pub struct Provisioning<S> {
    store: S,
    policy: ProvisioningPolicy,
}

impl<S> Provisioning<S>
where
    S: IdentityStore,
{
    pub fn new(store: S) -> Self {
        Self::with_policy(store, ProvisioningPolicy::default())
    }

    pub fn with_policy(store: S, policy: ProvisioningPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a tenant and its founding user from a completed external login.
    ///
    /// The correlation token is carried through untouched; consuming it is
    /// the caller's job.
    pub fn create_tenant(&self, cmd: &CreateTenant, now: DateTime<Utc>) -> IdentityResult<(Tenant, User)> {
        let claims = cmd.user_claims.as_ref().ok_or(DomainError::Unauthorized)?;
        claims.validate(now)?;
        DomainError::ensure_not_blank("tenant name", &cmd.name)?;
        DomainError::ensure_not_blank("subdomain", &cmd.subdomain)?;

        let founder = NewUser {
            name: claims.oauth_name.clone(),
            email: claims.oauth_email.clone(),
            role: self.policy.founder_role,
            providers: vec![claims.provider_link()],
        };
        let (tenant, founder) = self
            .store
            .create_tenant_with_founder(&cmd.name, &cmd.subdomain, founder)
            .inspect_err(|e| {
                tracing::info!(subdomain = %cmd.subdomain, error = %e, "tenant creation rejected");
            })?;

        let has_correlation_token = !cmd.token.is_empty();
        tracing::info!(
            tenant_id = %tenant.id(),
            subdomain = %tenant.subdomain(),
            user_id = %founder.id,
            provider = %claims.oauth_provider,
            has_correlation_token,
            "tenant created"
        );
        Ok((tenant, founder))
    }

    /// Resolve the user behind a completed external login to `tenant_id`.
    ///
    /// Known provider identity wins; otherwise a user with the same email gets
    /// the provider linked; otherwise a new user is registered.
    pub fn sign_in_with_oauth(
        &self,
        tenant_id: TenantId,
        claims: &OAuthClaims,
        now: DateTime<Utc>,
    ) -> IdentityResult<User> {
        claims.validate(now)?;
        self.store.get_tenant(tenant_id)?;

        if let Some(user) =
            self.store
                .find_user_by_provider(tenant_id, &claims.oauth_provider, &claims.oauth_id)?
        {
            return Ok(user);
        }

        if !claims.oauth_email.is_empty() {
            if let Some(user) = self.store.find_user_by_email(tenant_id, &claims.oauth_email)? {
                let user = self.store.add_provider(user.id, claims.provider_link())?;
                tracing::info!(user_id = %user.id, provider = %claims.oauth_provider, "provider linked");
                return Ok(user);
            }
        }

        let user = self.store.create_user(tenant_id, NewUser {
            name: claims.oauth_name.clone(),
            email: claims.oauth_email.clone(),
            role: self.policy.newcomer_role,
            providers: vec![claims.provider_link()],
        })?;
        tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Link another provider to an existing user.
    pub fn link_provider(&self, user_id: UserId, claims: &OAuthClaims, now: DateTime<Utc>) -> IdentityResult<User> {
        claims.validate(now)?;
        let user = self.store.add_provider(user_id, claims.provider_link())?;
        tracing::info!(user_id = %user_id, provider = %claims.oauth_provider, "provider linked");
        Ok(user)
    }

    pub fn update_tenant_settings(
        &self,
        actor: &User,
        tenant_id: TenantId,
        cmd: &UpdateTenantSettings,
        now: DateTime<Utc>,
    ) -> IdentityResult<Tenant> {
        authorize(actor, tenant_id, cmd)?;
        if let Some(claims) = &cmd.user_claims {
            claims.validate(now)?;
        }
        DomainError::ensure_not_blank("title", &cmd.title)?;

        let tenant = self.store.update_tenant_settings(tenant_id, cmd)?;

        tracing::info!(tenant_id = %tenant_id, actor_id = %actor.id, "tenant settings updated");
        Ok(tenant)
    }

    /// Point a custom domain at the tenant; administrators only.
    pub fn set_cname(&self, actor: &User, tenant_id: TenantId, cname: &str) -> IdentityResult<Tenant> {
        require_role(actor, Role::Administrator)?;
        require_tenant(actor, tenant_id)?;

        let tenant = self.store.set_tenant_cname(tenant_id, cname)?;
        tracing::info!(tenant_id = %tenant_id, actor_id = %actor.id, cname = %cname, "tenant cname set");
        Ok(tenant)
    }

    /// Administrators change roles of users in their own tenant.
    pub fn change_role(&self, actor: &User, target: UserId, role: Role) -> IdentityResult<User> {
        require_role(actor, Role::Administrator)?;
        let user = self.store.get_user(target)?;
        require_tenant(actor, user.tenant_id())?;

        let user = self.store.set_role(target, role)?;
        tracing::info!(actor_id = %actor.id, user_id = %target, role = %role, "role changed");
        Ok(user)
    }
}
