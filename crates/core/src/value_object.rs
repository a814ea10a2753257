//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity** and are compared by their attribute
/// values. A provider link is one: two links naming the same provider and uid
/// are interchangeable.
///
/// To "modify" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
