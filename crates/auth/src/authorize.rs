//! Role-based authorization checks.
//!
//! - No IO
//! - No panics
//! - Evaluated before any mutating operation runs

use tenancy_core::TenantId;

use crate::{CreateTenant, IdentityError, IdentityResult, Role, UpdateTenantSettings, User};

/// Command-side authorization contract (checked at the command boundary).
pub trait CommandAuthorization {
    /// Minimum role of the acting user, or `None` when the command's
    /// authority comes from embedded OAuth claims instead of a session.
    fn required_role(&self) -> Option<Role>;
}

impl CommandAuthorization for CreateTenant {
    fn required_role(&self) -> Option<Role> {
        None
    }
}

impl CommandAuthorization for UpdateTenantSettings {
    fn required_role(&self) -> Option<Role> {
        Some(Role::Administrator)
    }
}

/// Require `user` to be at or above `required`.
pub fn require_role(user: &User, required: Role) -> IdentityResult<()> {
    if user.role.satisfies(required) {
        Ok(())
    } else {
        Err(IdentityError::Forbidden {
            required,
            actual: user.role,
        })
    }
}

pub fn require_staff(user: &User) -> IdentityResult<()> {
    require_role(user, Role::Member)
}

/// Require `user` to be acting inside its own tenant.
pub fn require_tenant(user: &User, tenant_id: TenantId) -> IdentityResult<()> {
    if user.tenant_id() == tenant_id {
        Ok(())
    } else {
        Err(IdentityError::TenantMismatch)
    }
}

/// Authorize `actor` to run `command` against `tenant_id`.
pub fn authorize<C>(actor: &User, tenant_id: TenantId, command: &C) -> IdentityResult<()>
where
    C: CommandAuthorization,
{
    require_tenant(actor, tenant_id)?;
    match command.required_role() {
        Some(required) => require_role(actor, required),
        None => Ok(()),
    }
}
