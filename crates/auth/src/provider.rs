//! External identity provider links.

use serde::{Deserialize, Serialize};

use tenancy_core::ValueObject;

/// Links a user to an external identity provider.
///
/// `name` is the provider key (e.g. `"google"`), `uid` the id that provider
/// assigned to the user. Uniqueness per (user, provider) is kept by [`crate::User`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderLink {
    pub name: String,
    pub uid: String,
}

impl ProviderLink {
    pub fn new(name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: uid.into(),
        }
    }
}

impl ValueObject for ProviderLink {}
