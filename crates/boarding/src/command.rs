use serde::{Deserialize, Serialize};

use boardwise_core::{Aggregate, DomainError, DomainResult, PassengerId};

use crate::list::BoardingList;
use crate::status::BoardingStatus;
use crate::updater::BoardingUpdater;

/// A requested boarding transition, as data.
///
/// `status` stays a raw string until execution so that requests arriving from
/// outside are rejected with `InvalidArgument` instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardingCommand {
    UpdateStatus {
        passenger_id: PassengerId,
        status: String,
    },
    Close,
}

impl BoardingCommand {
    pub fn update_status(passenger_id: PassengerId, status: BoardingStatus) -> Self {
        Self::UpdateStatus {
            passenger_id,
            status: status.as_str().to_string(),
        }
    }

    pub fn close() -> Self {
        Self::Close
    }
}

impl BoardingUpdater {
    /// Run `command` against `list` under this updater's policy.
    pub fn execute(
        &self,
        list: &BoardingList,
        command: &BoardingCommand,
    ) -> DomainResult<BoardingList> {
        match command {
            BoardingCommand::UpdateStatus {
                passenger_id,
                status,
            } => {
                let status = status.parse::<BoardingStatus>()?;
                self.update_boarding_status(list, *passenger_id, status)
            }
            BoardingCommand::Close => self.close_boarding_list(list),
        }
    }
}

impl Aggregate for BoardingList {
    type Command = BoardingCommand;
    type Error = DomainError;

    fn execute(&self, command: &Self::Command) -> Result<Self, Self::Error> {
        BoardingUpdater::default().execute(self, command)
    }
}
