//! Validated status transitions for a [`BoardingList`].
//!
//! Every operation reads the current snapshot and returns a new one; the input
//! is never modified. Promoting a list to `completed` is its own operation so
//! a status update never closes a list implicitly.

use boardwise_core::{DomainError, DomainResult, PassengerId};

use crate::list::BoardingList;
use crate::status::{BoardingStatus, TransitionPolicy};

/// Applies boarding transitions under a [`TransitionPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardingUpdater {
    policy: TransitionPolicy,
}

impl BoardingUpdater {
    pub fn new(policy: TransitionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Return a copy of `list` with one passenger's status replaced.
    ///
    /// Errors:
    /// - `ClosedAggregate` if `list` is already completed
    /// - `NotFound` if no entry has `passenger_id`
    /// - `InvalidTransition` if the policy refuses the change
    pub fn update_boarding_status(
        &self,
        list: &BoardingList,
        passenger_id: PassengerId,
        new_status: BoardingStatus,
    ) -> DomainResult<BoardingList> {
        if list.is_completed() {
            return Err(DomainError::closed(format!(
                "boarding list {} is completed",
                list.id_typed()
            )));
        }

        let current = list.entry(passenger_id).ok_or_else(|| {
            DomainError::not_found(format!(
                "passenger {passenger_id} is not on boarding list {}",
                list.id_typed()
            ))
        })?;
        self.policy.check(current.status(), new_status)?;

        let entries = list
            .entries()
            .iter()
            .map(|entry| {
                if entry.passenger_id() == passenger_id {
                    entry.with_status(new_status)
                } else {
                    *entry
                }
            })
            .collect();
        let next = list.with_entries(entries);

        tracing::debug!(
            boarding_list_id = %list.id_typed(),
            passenger_id = %passenger_id,
            from = %current.status(),
            to = %new_status,
            waiting = next.waiting_count(),
            "boarding status updated"
        );

        Ok(next)
    }

    /// Return a copy of `list` marked completed.
    ///
    /// Closing an already completed list returns an equal value.
    pub fn close_boarding_list(&self, list: &BoardingList) -> DomainResult<BoardingList> {
        if list.is_completed() {
            return Ok(list.clone());
        }

        let waiting = list.waiting_count();
        if waiting > 0 {
            return Err(DomainError::invariant(format!(
                "boarding list {} still has {waiting} passenger(s) waiting for boarding",
                list.id_typed()
            )));
        }

        tracing::debug!(boarding_list_id = %list.id_typed(), "boarding list closed");
        Ok(list.completed())
    }
}

/// [`BoardingUpdater::update_boarding_status`] with the default (strict) policy.
pub fn update_boarding_status(
    list: &BoardingList,
    passenger_id: PassengerId,
    new_status: BoardingStatus,
) -> DomainResult<BoardingList> {
    BoardingUpdater::default().update_boarding_status(list, passenger_id, new_status)
}

/// [`BoardingUpdater::close_boarding_list`] with the default policy.
pub fn close_boarding_list(list: &BoardingList) -> DomainResult<BoardingList> {
    BoardingUpdater::default().close_boarding_list(list)
}
