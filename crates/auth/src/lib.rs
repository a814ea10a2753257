//! `tenancy-auth`: multi-tenant identity and authorization core.
//!
//! This crate is intentionally decoupled from HTTP and storage: tenants, users,
//! roles and token payloads, plus the HS256 issuer that signs them.

pub mod authorize;
pub mod claims;
pub mod commands;
pub mod config;
pub mod error;
pub mod jwt;
pub mod provider;
pub mod roles;
pub mod tenant;
pub mod user;

pub use authorize::{CommandAuthorization, authorize, require_role, require_staff, require_tenant};
pub use claims::{Claims, OAuthClaims, OAuthIdentity, SessionClaims, StandardClaims, validate_claims};
pub use commands::{CreateTenant, UpdateTenantSettings};
pub use config::TokenConfig;
pub use error::{IdentityError, IdentityResult};
pub use jwt::{Hs256TokenIssuer, JwtValidator};
pub use provider::ProviderLink;
pub use roles::{Role, is_staff};
pub use tenant::Tenant;
pub use user::User;
