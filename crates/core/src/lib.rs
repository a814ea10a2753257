//! `tenancy-core`: identity foundation building blocks.
//!
//! This crate contains **pure** primitives shared by the identity layer (no
//! storage, no transport).

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{TenantId, UserId};
pub use value_object::ValueObject;
