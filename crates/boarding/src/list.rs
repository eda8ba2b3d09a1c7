use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use boardwise_core::{
    AggregateRoot, BoardingListId, DomainError, DomainResult, Entity, FlightId, PassengerId,
};

use crate::status::BoardingStatus;

/// One passenger's boarding state within a list.
///
/// Immutable: a status change produces a new entry via [`with_status`](Self::with_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardingListEntry {
    passenger_id: PassengerId,
    status: BoardingStatus,
}

impl BoardingListEntry {
    pub fn new(passenger_id: PassengerId, status: BoardingStatus) -> Self {
        Self {
            passenger_id,
            status,
        }
    }

    /// A freshly listed passenger, not yet boarded.
    pub fn waiting(passenger_id: PassengerId) -> Self {
        Self::new(passenger_id, BoardingStatus::WaitForBoarding)
    }

    pub fn passenger_id(&self) -> PassengerId {
        self.passenger_id
    }

    pub fn status(&self) -> BoardingStatus {
        self.status
    }

    pub fn with_status(self, status: BoardingStatus) -> Self {
        Self { status, ..self }
    }

    pub fn is_waiting(&self) -> bool {
        self.status == BoardingStatus::WaitForBoarding
    }
}

impl Entity for BoardingListEntry {
    type Id = PassengerId;

    fn id(&self) -> &Self::Id {
        &self.passenger_id
    }
}

/// Aggregate root: BoardingList.
///
/// Holds every boarding entry of one flight. The flight itself is a separate
/// aggregate and is referenced by `flight_id` only.
///
/// Invariant: `completed` implies no entry is `WaitForBoarding`. The fields are
/// private and every constructor checks it, so no value of this type can
/// break it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardingListRecord", into = "BoardingListRecord")]
pub struct BoardingList {
    id: BoardingListId,
    flight_id: FlightId,
    entries: Vec<BoardingListEntry>,
    completed: bool,
}

/// Plain serialised shape of a [`BoardingList`].
///
/// Converting back into a `BoardingList` re-validates the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardingListRecord {
    pub id: BoardingListId,
    pub flight_id: FlightId,
    pub entries: Vec<BoardingListEntry>,
    pub completed: bool,
}

impl BoardingList {
    /// Open a new list with every passenger waiting for boarding.
    pub fn open(
        id: BoardingListId,
        flight_id: FlightId,
        passengers: impl IntoIterator<Item = PassengerId>,
    ) -> DomainResult<Self> {
        let entries: Vec<_> = passengers
            .into_iter()
            .map(BoardingListEntry::waiting)
            .collect();
        ensure_unique_passengers(&entries)?;

        Ok(Self {
            id,
            flight_id,
            entries,
            completed: false,
        })
    }

    /// Rehydrate a list from previously stored parts.
    pub fn from_parts(
        id: BoardingListId,
        flight_id: FlightId,
        entries: Vec<BoardingListEntry>,
        completed: bool,
    ) -> DomainResult<Self> {
        ensure_unique_passengers(&entries)?;
        let list = Self {
            id,
            flight_id,
            entries,
            completed,
        };
        if list.completed && list.has_waiting() {
            return Err(DomainError::invariant(format!(
                "boarding list {} is completed but still has waiting passengers",
                list.id
            )));
        }
        Ok(list)
    }

    pub fn id_typed(&self) -> BoardingListId {
        self.id
    }

    pub fn flight_id(&self) -> FlightId {
        self.flight_id
    }

    pub fn entries(&self) -> &[BoardingListEntry] {
        &self.entries
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn entry(&self, passenger_id: PassengerId) -> Option<&BoardingListEntry> {
        self.entries
            .iter()
            .find(|entry| entry.passenger_id == passenger_id)
    }

    pub fn has_waiting(&self) -> bool {
        self.entries.iter().any(BoardingListEntry::is_waiting)
    }

    pub fn waiting_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_waiting()).count()
    }

    /// Same list with `entries` swapped in. The caller keeps `completed` consistent.
    pub(crate) fn with_entries(&self, entries: Vec<BoardingListEntry>) -> Self {
        Self {
            entries,
            ..self.clone()
        }
    }

    /// Same list marked completed. The caller has checked nothing is waiting.
    pub(crate) fn completed(&self) -> Self {
        Self {
            completed: true,
            ..self.clone()
        }
    }
}

impl AggregateRoot for BoardingList {
    type Id = BoardingListId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TryFrom<BoardingListRecord> for BoardingList {
    type Error = DomainError;

    fn try_from(record: BoardingListRecord) -> Result<Self, Self::Error> {
        Self::from_parts(record.id, record.flight_id, record.entries, record.completed)
    }
}

impl From<BoardingList> for BoardingListRecord {
    fn from(list: BoardingList) -> Self {
        Self {
            id: list.id,
            flight_id: list.flight_id,
            entries: list.entries,
            completed: list.completed,
        }
    }
}

fn ensure_unique_passengers(entries: &[BoardingListEntry]) -> DomainResult<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.passenger_id) {
            return Err(DomainError::invalid_argument(format!(
                "passenger {} appears more than once",
                entry.passenger_id
            )));
        }
    }
    Ok(())
}
