//! Versioned snapshot store boundary.
//!
//! Callers serialize updates to one aggregate through a compare-and-swap on
//! the stored version token. Nothing here is durable; a database-backed
//! implementation would sit behind the same trait.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemorySnapshotStore;
pub use r#trait::{SnapshotStore, StoreError, Versioned};
