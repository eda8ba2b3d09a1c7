//! Aggregate root traits for snapshot-replacement domain models.

use crate::error::{DomainError, DomainResult};

/// Aggregate root marker + minimal interface.
///
/// The root is the only thing outside code may hold on to; its entities are
/// reachable through it alone.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;
}

/// Optimistic concurrency expectation for a stored aggregate snapshot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// No snapshot may exist yet.
    NoSnapshot,
    /// Require the stored snapshot to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// `actual` is `None` when nothing has been stored for the aggregate.
    pub fn matches(self, actual: Option<u64>) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::NoSnapshot => actual.is_none(),
            ExpectedVersion::Exact(v) => actual == Some(v),
        }
    }

    pub fn check(self, actual: Option<u64>) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual:?})"
            )))
        }
    }
}

/// Aggregate execution semantics (pure, deterministic).
///
/// A command is decided against the current immutable snapshot and either
/// yields a whole new snapshot or is rejected. `&self` is never changed, so a
/// caller holding the old value keeps a consistent view of it.
///
/// Aggregates must not perform IO or side effects.
pub trait Aggregate: AggregateRoot + Clone + Sized {
    type Command: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Produce the next snapshot for `command`, or reject it.
    fn execute(&self, command: &Self::Command) -> Result<Self, Self::Error>;

    /// Apply commands in order, stopping at the first rejection.
    fn replay<'a, I>(&self, commands: I) -> Result<Self, Self::Error>
    where
        I: IntoIterator<Item = &'a Self::Command>,
        Self::Command: 'a,
    {
        commands
            .into_iter()
            .try_fold(self.clone(), |current, command| current.execute(command))
    }
}
