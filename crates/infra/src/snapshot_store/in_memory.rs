use std::collections::HashMap;
use std::sync::RwLock;

use boardwise_core::{AggregateRoot, ExpectedVersion};

use super::r#trait::{SnapshotStore, StoreError, Versioned};

/// In-memory snapshot store.
///
/// Intended for tests/dev. Snapshots live as long as the store does.
#[derive(Debug)]
pub struct InMemorySnapshotStore<A>
where
    A: AggregateRoot,
{
    snapshots: RwLock<HashMap<A::Id, Versioned<A>>>,
}

impl<A> InMemorySnapshotStore<A>
where
    A: AggregateRoot,
{
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(snapshots.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl<A> Default for InMemorySnapshotStore<A>
where
    A: AggregateRoot,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A> SnapshotStore<A> for InMemorySnapshotStore<A>
where
    A: AggregateRoot + Clone + Send + Sync,
    A::Id: Send + Sync,
{
    fn load(&self, id: &A::Id) -> Result<Option<Versioned<A>>, StoreError> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;
        Ok(snapshots.get(id).cloned())
    }

    fn save(&self, snapshot: A, expected: ExpectedVersion) -> Result<u64, StoreError> {
        let mut snapshots = self.snapshots.write().map_err(|_| StoreError::Poisoned)?;

        let id = snapshot.id().clone();
        let current = snapshots.get(&id).map(|stored| stored.version);
        expected
            .check(current)
            .map_err(|e| StoreError::Concurrency(format!("{id:?}: {e}")))?;

        let version = current.unwrap_or(0) + 1;
        snapshots.insert(id, Versioned { version, snapshot });
        Ok(version)
    }
}
