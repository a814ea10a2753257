//! User roles and their ordering.

use serde::{Deserialize, Serialize};

use crate::IdentityError;

/// Privilege level of a user within its tenant.
///
/// The integer backing values are persisted and compared raw by other
/// services, so they are fixed: `Visitor = 1`, `Member = 2`,
/// `Administrator = 3`. Declaration order gives the total order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum Role {
    /// Basic role for every user.
    Visitor = 1,
    /// Limited access to the administrative console.
    Member = 2,
    /// Full access to the administrative console.
    Administrator = 3,
}

impl Role {
    /// Raw persisted level.
    pub const fn level(self) -> i32 {
        self as i32
    }

    /// True iff this role meets or exceeds `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }

    /// Staff are members and administrators.
    pub fn is_staff(self) -> bool {
        self.satisfies(Role::Member)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Visitor => "visitor",
            Role::Member => "member",
            Role::Administrator => "administrator",
        }
    }
}

/// Staff check on a raw persisted level.
pub fn is_staff(level: i32) -> bool {
    level >= Role::Member.level()
}

impl TryFrom<i32> for Role {
    type Error = IdentityError;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(Role::Visitor),
            2 => Ok(Role::Member),
            3 => Ok(Role::Administrator),
            other => Err(IdentityError::InvalidRole(other)),
        }
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> Self {
        role.level()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
