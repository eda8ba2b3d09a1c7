use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boardwise_core::{BoardingListId, FlightId, PassengerId};
use boardwise_events::Event;

use crate::list::BoardingList;
use crate::status::BoardingStatus;

/// Event: BoardingStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardingStatusChanged {
    pub boarding_list_id: BoardingListId,
    pub flight_id: FlightId,
    pub passenger_id: PassengerId,
    pub old_status: BoardingStatus,
    pub new_status: BoardingStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BoardingListClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardingListClosed {
    pub boarding_list_id: BoardingListId,
    pub flight_id: FlightId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardingEvent {
    StatusChanged(BoardingStatusChanged),
    ListClosed(BoardingListClosed),
}

impl BoardingEvent {
    /// Describe what changed between two snapshots of the same list.
    ///
    /// Status changes come first, in entry order, followed by the closure.
    /// Snapshots of different lists yield nothing.
    pub fn derive(
        old: &BoardingList,
        new: &BoardingList,
        occurred_at: DateTime<Utc>,
    ) -> Vec<BoardingEvent> {
        if old.id_typed() != new.id_typed() {
            return Vec::new();
        }

        let mut events: Vec<BoardingEvent> = new
            .entries()
            .iter()
            .filter_map(|after| {
                let before = old.entry(after.passenger_id())?;
                (before.status() != after.status()).then(|| {
                    BoardingEvent::StatusChanged(BoardingStatusChanged {
                        boarding_list_id: new.id_typed(),
                        flight_id: new.flight_id(),
                        passenger_id: after.passenger_id(),
                        old_status: before.status(),
                        new_status: after.status(),
                        occurred_at,
                    })
                })
            })
            .collect();

        if new.is_completed() && !old.is_completed() {
            events.push(BoardingEvent::ListClosed(BoardingListClosed {
                boarding_list_id: new.id_typed(),
                flight_id: new.flight_id(),
                occurred_at,
            }));
        }

        events
    }
}

impl Event for BoardingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BoardingEvent::StatusChanged(_) => "boarding.entry.status_changed",
            BoardingEvent::ListClosed(_) => "boarding.list.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BoardingEvent::StatusChanged(e) => e.occurred_at,
            BoardingEvent::ListClosed(e) => e.occurred_at,
        }
    }
}
