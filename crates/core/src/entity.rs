//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Tenants and users are entities: two values with the same id are the same
/// record even if their mutable settings differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Same record, regardless of mutable attributes.
    fn same_identity_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
