use core::str::FromStr;
use serde::{Deserialize, Serialize};

use boardwise_core::{DomainError, ValueObject};

/// Boarding state of one passenger.
///
/// `WaitForBoarding` is the initial state; `Boarded` and `NoShow` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardingStatus {
    WaitForBoarding,
    Boarded,
    NoShow,
}

impl ValueObject for BoardingStatus {}

impl BoardingStatus {
    pub const ALL: [BoardingStatus; 3] = [
        BoardingStatus::WaitForBoarding,
        BoardingStatus::Boarded,
        BoardingStatus::NoShow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BoardingStatus::WaitForBoarding => "WAIT_FOR_BOARDING",
            BoardingStatus::Boarded => "BOARDED",
            BoardingStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, BoardingStatus::WaitForBoarding)
    }
}

impl core::fmt::Display for BoardingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoardingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoardingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::invalid_argument(format!(
                    "unknown boarding status '{s}' (expected WAIT_FOR_BOARDING, BOARDED or NO_SHOW)"
                ))
            })
    }
}

/// Which entry-level status changes are accepted while a list is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    /// Only `WaitForBoarding -> Boarded | NoShow`. Re-setting the current
    /// status is accepted as a no-op.
    #[default]
    Strict,
    /// Any status may replace any other.
    Permissive,
}

impl TransitionPolicy {
    pub fn check(self, from: BoardingStatus, to: BoardingStatus) -> Result<(), DomainError> {
        if from == to {
            return Ok(());
        }
        match self {
            TransitionPolicy::Permissive => Ok(()),
            TransitionPolicy::Strict if !from.is_terminal() => Ok(()),
            TransitionPolicy::Strict => Err(DomainError::invalid_transition(format!(
                "{from} is terminal and cannot change to {to}"
            ))),
        }
    }
}

impl FromStr for TransitionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(TransitionPolicy::Strict),
            "permissive" => Ok(TransitionPolicy::Permissive),
            other => Err(DomainError::invalid_argument(format!(
                "unknown transition policy '{other}'"
            ))),
        }
    }
}
