//! Infrastructure layer: identity persistence and the provisioning flow.

pub mod provisioning;
pub mod store;

pub use provisioning::{Provisioning, ProvisioningPolicy};
pub use store::{IdentityStore, InMemoryIdentityStore, NewUser};
