use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use thiserror::Error;

use boardwise_boarding::{BoardingEvent, BoardingStatus};
use boardwise_core::{BoardingListId, FlightId, PassengerId};
use boardwise_events::EventEnvelope;

/// Per-flight view of how boarding is going, built from published events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightBoardingProgress {
    pub flight_id: FlightId,
    pub boarding_list_id: BoardingListId,
    /// Last known status of every passenger that has changed at least once.
    pub statuses: BTreeMap<PassengerId, BoardingStatus>,
    pub closed: bool,
}

impl FlightBoardingProgress {
    fn new(flight_id: FlightId, boarding_list_id: BoardingListId) -> Self {
        Self {
            flight_id,
            boarding_list_id,
            statuses: BTreeMap::new(),
            closed: false,
        }
    }

    pub fn count(&self, status: BoardingStatus) -> usize {
        self.statuses.values().filter(|s| **s == status).count()
    }

    pub fn boarded(&self) -> usize {
        self.count(BoardingStatus::Boarded)
    }

    pub fn no_shows(&self) -> usize {
        self.count(BoardingStatus::NoShow)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoardingProgressError {
    #[error("projection state lock poisoned")]
    Poisoned,
    #[error("flight {flight_id} already tracks boarding list {existing}, got {incoming}")]
    ListMismatch {
        flight_id: FlightId,
        existing: BoardingListId,
        incoming: BoardingListId,
    },
}

#[derive(Debug, Default)]
struct State {
    flights: HashMap<FlightId, FlightBoardingProgress>,
    /// Highest snapshot version applied per flight.
    cursors: HashMap<FlightId, u64>,
}

/// Read model of boarding progress keyed by flight.
///
/// Idempotent under at-least-once delivery: envelopes older than the last
/// applied version of a flight are skipped, and re-applying one is harmless.
#[derive(Debug, Default)]
pub struct BoardingProgressProjection {
    state: RwLock<State>,
}

impl BoardingProgressProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, flight_id: FlightId) -> Option<FlightBoardingProgress> {
        self.state.read().ok()?.flights.get(&flight_id).cloned()
    }

    /// Returns whether the envelope changed the read model.
    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<BoardingEvent>,
    ) -> Result<bool, BoardingProgressError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| BoardingProgressError::Poisoned)?;

        let (flight_id, list_id) = match envelope.payload() {
            BoardingEvent::StatusChanged(e) => (e.flight_id, e.boarding_list_id),
            BoardingEvent::ListClosed(e) => (e.flight_id, e.boarding_list_id),
        };

        let seq = envelope.sequence_number();
        let last = state.cursors.get(&flight_id).copied().unwrap_or(0);
        if seq < last {
            tracing::debug!(%flight_id, seq, last, "skipping stale boarding envelope");
            return Ok(false);
        }

        let progress = state
            .flights
            .entry(flight_id)
            .or_insert_with(|| FlightBoardingProgress::new(flight_id, list_id));
        if progress.boarding_list_id != list_id {
            return Err(BoardingProgressError::ListMismatch {
                flight_id,
                existing: progress.boarding_list_id,
                incoming: list_id,
            });
        }

        let changed = match envelope.payload() {
            BoardingEvent::StatusChanged(e) => {
                progress.statuses.insert(e.passenger_id, e.new_status) != Some(e.new_status)
            }
            BoardingEvent::ListClosed(_) => !std::mem::replace(&mut progress.closed, true),
        };

        state.cursors.insert(flight_id, seq);
        Ok(changed)
    }
}
