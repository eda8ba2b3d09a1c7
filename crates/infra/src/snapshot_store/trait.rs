use std::sync::Arc;

use thiserror::Error;

use boardwise_core::{AggregateRoot, ExpectedVersion};

/// A stored snapshot together with its version token.
///
/// Versions start at 1 for the first save and grow by one per save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<A> {
    pub version: u64,
    pub snapshot: A,
}

/// Snapshot store operation error.
///
/// These are infrastructure failures, as opposed to domain rejections.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("snapshot store lock poisoned")]
    Poisoned,
}

/// Whole-aggregate snapshot store with optimistic concurrency.
///
/// `save` replaces the stored snapshot only if `expected` matches the current
/// version, and returns the new version.
pub trait SnapshotStore<A>: Send + Sync
where
    A: AggregateRoot,
{
    fn load(&self, id: &A::Id) -> Result<Option<Versioned<A>>, StoreError>;

    fn save(&self, snapshot: A, expected: ExpectedVersion) -> Result<u64, StoreError>;
}

impl<A, S> SnapshotStore<A> for Arc<S>
where
    A: AggregateRoot,
    S: SnapshotStore<A> + ?Sized,
{
    fn load(&self, id: &A::Id) -> Result<Option<Versioned<A>>, StoreError> {
        (**self).load(id)
    }

    fn save(&self, snapshot: A, expected: ExpectedVersion) -> Result<u64, StoreError> {
        (**self).save(snapshot, expected)
    }
}
