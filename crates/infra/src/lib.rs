//! Infrastructure layer: snapshot storage, dispatch, read models, config.
//!
//! Everything here sits around the pure boarding domain; nothing in this
//! crate decides whether a transition is allowed.

pub mod command_dispatcher;
pub mod config;
pub mod projections;
pub mod snapshot_store;

#[cfg(test)]
mod integration_tests;

pub use command_dispatcher::{BoardingDispatcher, DispatchError, DispatchOutcome};
pub use config::{BoardwiseConfig, ConfigError};
pub use snapshot_store::{InMemorySnapshotStore, SnapshotStore, StoreError, Versioned};
