//! Boarding command execution pipeline (application-level orchestration).
//!
//! ```text
//! BoardingCommand
//!   ↓
//! 1. Load the current snapshot + version token
//!   ↓
//! 2. Transition (pure, BoardingUpdater)
//!   ↓
//! 3. Save with ExpectedVersion::Exact(loaded)   ── conflict ──┐
//!   ↓                                                          │
//! 4. Derive domain events from (old, new)        reload and re-apply
//!   ↓                                            the same command
//! 5. Publish envelopes to the bus                              │
//!                                                ◄─────────────┘
//! ```
//!
//! The domain crate never sees the store or the bus; this module composes
//! them around the pure transition functions.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use boardwise_boarding::{BoardingCommand, BoardingEvent, BoardingList, BoardingUpdater};
use boardwise_core::{BoardingListId, DomainError, ExpectedVersion};
use boardwise_events::{EventBus, EventEnvelope};

use crate::config::BoardwiseConfig;
use crate::snapshot_store::{SnapshotStore, StoreError, Versioned};

/// Aggregate type tag used on published envelopes.
pub const BOARDING_LIST_AGGREGATE: &str = "boarding.list";

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The transition was rejected by the domain.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No snapshot is stored for the requested list.
    #[error("boarding list {0} not found")]
    ListNotFound(BoardingListId),

    /// The store failed for a reason other than a retryable conflict.
    #[error(transparent)]
    Store(StoreError),

    /// Every attempt lost the race against a concurrent writer.
    #[error("gave up after {attempts} conflicting attempt(s)")]
    RetriesExhausted { attempts: u32 },

    /// The snapshot was saved as `version` but publishing stopped part way.
    ///
    /// `undelivered` holds the failed envelope and everything after it; hand
    /// it to [`BoardingDispatcher::republish`] once the bus recovers.
    #[error("event publication failed at version {version}: {reason}")]
    Publish {
        version: u64,
        undelivered: Vec<EventEnvelope<BoardingEvent>>,
        reason: String,
    },
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        DispatchError::Store(value)
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub previous: BoardingList,
    pub current: BoardingList,
    /// Version of `current` in the store.
    pub version: u64,
    /// Envelopes that were published (empty for a no-op transition).
    pub events: Vec<EventEnvelope<BoardingEvent>>,
}

/// Serializes boarding transitions per list and publishes what changed.
#[derive(Debug)]
pub struct BoardingDispatcher<S, B> {
    store: S,
    bus: B,
    updater: BoardingUpdater,
    max_conflict_retries: u32,
}

impl<S, B> BoardingDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self::from_config(store, bus, &BoardwiseConfig::default())
    }

    pub fn from_config(store: S, bus: B, config: &BoardwiseConfig) -> Self {
        Self {
            store,
            bus,
            updater: BoardingUpdater::new(config.transition_policy),
            max_conflict_retries: config.max_conflict_retries,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> BoardingDispatcher<S, B>
where
    S: SnapshotStore<BoardingList>,
    B: EventBus<EventEnvelope<BoardingEvent>>,
{
    /// Store a freshly opened list. Fails if the id is already taken.
    #[instrument(skip(self, list), fields(boarding_list_id = %list.id_typed()))]
    pub fn register(&self, list: BoardingList) -> Result<u64, DispatchError> {
        let version = self.store.save(list, ExpectedVersion::NoSnapshot)?;
        debug!(version, "boarding list registered");
        Ok(version)
    }

    /// Load the latest snapshot of a list.
    pub fn current(&self, list_id: BoardingListId) -> Result<Versioned<BoardingList>, DispatchError> {
        self.store
            .load(&list_id)?
            .ok_or(DispatchError::ListNotFound(list_id))
    }

    /// Run `command` against the latest snapshot of `list_id`.
    ///
    /// A save that loses a race is retried against the newer snapshot, up to
    /// the configured retry limit. Domain rejections are returned as-is.
    #[instrument(skip(self), fields(policy = ?self.updater.policy()))]
    pub fn dispatch(
        &self,
        list_id: BoardingListId,
        command: &BoardingCommand,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut attempt: u32 = 0;
        loop {
            let Versioned { version, snapshot } = self.current(list_id)?;
            let next = self.updater.execute(&snapshot, command)?;

            if next == snapshot {
                debug!(version, "transition is a no-op; nothing saved");
                return Ok(DispatchOutcome {
                    previous: snapshot,
                    current: next,
                    version,
                    events: Vec::new(),
                });
            }

            match self.store.save(next.clone(), ExpectedVersion::Exact(version)) {
                Ok(new_version) => {
                    let events = self.publish(&snapshot, &next, new_version)?;
                    if next.is_completed() && !snapshot.is_completed() {
                        info!(version = new_version, "boarding list closed");
                    }
                    return Ok(DispatchOutcome {
                        previous: snapshot,
                        current: next,
                        version: new_version,
                        events,
                    });
                }
                Err(StoreError::Concurrency(reason)) if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    warn!(attempt, %reason, "concurrent update detected; replaying on latest snapshot");
                }
                Err(StoreError::Concurrency(reason)) => {
                    warn!(attempts = attempt + 1, %reason, "giving up after repeated conflicts");
                    return Err(DispatchError::RetriesExhausted {
                        attempts: attempt + 1,
                    });
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Publish envelopes left over from a failed dispatch, in order.
    ///
    /// The snapshot is not touched. On another failure the error carries
    /// whatever is still undelivered.
    #[instrument(skip_all, fields(pending = envelopes.len()))]
    pub fn republish(
        &self,
        envelopes: Vec<EventEnvelope<BoardingEvent>>,
    ) -> Result<(), DispatchError> {
        let version = envelopes.first().map_or(0, |e| e.sequence_number());
        self.publish_all(&envelopes, version)?;
        debug!(version, "undelivered events republished");
        Ok(())
    }

    fn publish(
        &self,
        previous: &BoardingList,
        current: &BoardingList,
        version: u64,
    ) -> Result<Vec<EventEnvelope<BoardingEvent>>, DispatchError> {
        let envelopes: Vec<_> = BoardingEvent::derive(previous, current, Utc::now())
            .into_iter()
            .map(|event| {
                EventEnvelope::wrap(BOARDING_LIST_AGGREGATE, current.id_typed(), version, event)
            })
            .collect();

        self.publish_all(&envelopes, version)?;
        Ok(envelopes)
    }

    fn publish_all(
        &self,
        envelopes: &[EventEnvelope<BoardingEvent>],
        version: u64,
    ) -> Result<(), DispatchError> {
        for (sent, envelope) in envelopes.iter().enumerate() {
            if let Err(e) = self.bus.publish(envelope.clone()) {
                warn!(version, sent, error = ?e, "event publication failed");
                return Err(DispatchError::Publish {
                    version,
                    undelivered: envelopes[sent..].to_vec(),
                    reason: format!("{e:?}"),
                });
            }
        }
        Ok(())
    }
}
