//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two instances
/// with the same attribute values are the same value. Cost figures and
/// resolution requirements are value objects; items and BOM edges are
/// entities (they carry an identity).
///
/// To "modify" a value object, construct a new one. The bounds keep value
/// objects cheap to copy, comparable and debuggable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
