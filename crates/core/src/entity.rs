//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// An entity inside an aggregate keeps its identity while its attributes are
/// replaced by newer values.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
