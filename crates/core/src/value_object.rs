//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attributes. To "change"
/// one, build a new value.
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum Status { Open, Closed }
///
/// impl ValueObject for Status {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
