//! Boarding domain module.
//!
//! A flight's boarding list is a single consistency boundary: its entries
//! change only through pure transition functions that take the current
//! snapshot and return a new one (no IO, no mutation, no event publishing).

pub mod command;
pub mod event;
pub mod list;
pub mod status;
pub mod updater;

pub use command::BoardingCommand;
pub use event::{BoardingEvent, BoardingListClosed, BoardingStatusChanged};
pub use list::{BoardingList, BoardingListEntry, BoardingListRecord};
pub use status::{BoardingStatus, TransitionPolicy};
pub use updater::{BoardingUpdater, close_boarding_list, update_boarding_status};
