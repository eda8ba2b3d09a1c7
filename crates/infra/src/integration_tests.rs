//! Integration tests for the boarding pipeline.
//!
//! BoardingCommand → SnapshotStore → EventBus → BoardingProgressProjection
//!
//! Verifies:
//! - accepted transitions are stored and published exactly once
//! - domain rejections leave the store untouched
//! - lost save races are replayed on the latest snapshot

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;
use std::thread;

use boardwise_boarding::{
    BoardingCommand, BoardingEvent, BoardingList, BoardingStatus, TransitionPolicy,
    update_boarding_status,
};
use boardwise_core::{
    AggregateRoot, BoardingListId, DomainError, ExpectedVersion, FlightId, PassengerId,
};
use boardwise_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};

use crate::command_dispatcher::{BoardingDispatcher, DispatchError};
use crate::config::BoardwiseConfig;
use crate::projections::BoardingProgressProjection;
use crate::snapshot_store::{InMemorySnapshotStore, SnapshotStore, StoreError, Versioned};

type Bus = Arc<InMemoryEventBus<EventEnvelope<BoardingEvent>>>;

const LIST: BoardingListId = BoardingListId::new(1);
const FLIGHT: FlightId = FlightId::new(10);

fn pid(n: u64) -> PassengerId {
    PassengerId::new(n)
}

fn board(n: u64) -> BoardingCommand {
    BoardingCommand::update_status(pid(n), BoardingStatus::Boarded)
}

fn open_list(passengers: u64) -> BoardingList {
    BoardingList::open(LIST, FLIGHT, (1..=passengers).map(PassengerId::new)).unwrap()
}

fn setup(
    passengers: u64,
) -> (
    BoardingDispatcher<InMemorySnapshotStore<BoardingList>, Bus>,
    Subscription<EventEnvelope<BoardingEvent>>,
) {
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let sub = bus.subscribe();
    let dispatcher = BoardingDispatcher::new(InMemorySnapshotStore::new(), bus);
    dispatcher.register(open_list(passengers)).unwrap();
    (dispatcher, sub)
}

#[test]
fn accepted_transition_is_stored_and_published() -> anyhow::Result<()> {
    let (dispatcher, sub) = setup(2);

    let outcome = dispatcher.dispatch(LIST, &board(1))?;

    assert_eq!(outcome.version, 2);
    assert_eq!(outcome.previous, open_list(2));
    assert_eq!(
        outcome.current.entry(pid(1)).map(|e| e.status()),
        Some(BoardingStatus::Boarded)
    );
    assert_eq!(dispatcher.current(LIST)?.snapshot, outcome.current);

    let published = sub.drain();
    assert_eq!(published, outcome.events);
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].event_type(), "boarding.entry.status_changed");
    assert_eq!(published[0].aggregate_id(), "1");
    assert_eq!(published[0].sequence_number(), 2);
    match published[0].payload() {
        BoardingEvent::StatusChanged(e) => {
            assert_eq!(e.flight_id, FLIGHT);
            assert_eq!(e.passenger_id, pid(1));
            assert_eq!(e.old_status, BoardingStatus::WaitForBoarding);
            assert_eq!(e.new_status, BoardingStatus::Boarded);
        }
        other => panic!("expected StatusChanged, got {other:?}"),
    }
    Ok(())
}

#[test]
fn published_events_drive_the_progress_projection() -> anyhow::Result<()> {
    let (dispatcher, sub) = setup(3);
    let projection = BoardingProgressProjection::new();

    dispatcher.dispatch(LIST, &board(1))?;
    dispatcher.dispatch(LIST, &board(2))?;
    dispatcher.dispatch(
        LIST,
        &BoardingCommand::update_status(pid(3), BoardingStatus::NoShow),
    )?;
    dispatcher.dispatch(LIST, &BoardingCommand::close())?;

    for envelope in sub.drain() {
        projection.apply_envelope(&envelope)?;
    }

    let progress = projection.get(FLIGHT).expect("flight tracked");
    assert_eq!(progress.boarded(), 2);
    assert_eq!(progress.no_shows(), 1);
    assert!(progress.closed);
    Ok(())
}

#[test]
fn unknown_list_is_reported() {
    let (dispatcher, _sub) = setup(1);
    let err = dispatcher
        .dispatch(BoardingListId::new(404), &board(1))
        .unwrap_err();
    assert!(matches!(err, DispatchError::ListNotFound(id) if id == BoardingListId::new(404)));
}

#[test]
fn domain_rejection_leaves_store_and_bus_untouched() {
    let (dispatcher, sub) = setup(2);

    let err = dispatcher.dispatch(LIST, &board(99)).unwrap_err();
    assert!(matches!(err, DispatchError::Domain(DomainError::NotFound(_))));

    let err = dispatcher.dispatch(LIST, &BoardingCommand::close()).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Domain(DomainError::InvariantViolation(_))
    ));

    let stored = dispatcher.current(LIST).unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.snapshot, open_list(2));
    assert!(sub.drain().is_empty());
}

#[test]
fn repeating_a_transition_saves_and_publishes_nothing() {
    let (dispatcher, sub) = setup(2);

    dispatcher.dispatch(LIST, &board(1)).unwrap();
    let again = dispatcher.dispatch(LIST, &board(1)).unwrap();

    assert_eq!(again.version, 2);
    assert!(again.events.is_empty());
    assert_eq!(sub.drain().len(), 1);
}

#[test]
fn closed_list_rejects_updates_through_the_dispatcher() {
    let (dispatcher, sub) = setup(1);
    dispatcher.dispatch(LIST, &board(1)).unwrap();

    let closed = dispatcher.dispatch(LIST, &BoardingCommand::close()).unwrap();
    assert!(closed.current.is_completed());
    assert_eq!(closed.events.len(), 1);
    assert_eq!(closed.events[0].event_type(), "boarding.list.closed");

    let err = dispatcher
        .dispatch(
            LIST,
            &BoardingCommand::update_status(pid(1), BoardingStatus::NoShow),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Domain(DomainError::ClosedAggregate(_))
    ));

    // Closing again is accepted and changes nothing.
    let again = dispatcher.dispatch(LIST, &BoardingCommand::close()).unwrap();
    assert_eq!(again.version, closed.version);
    assert_eq!(sub.drain().len(), 2);
}

#[test]
fn configured_policy_is_applied() {
    let config = BoardwiseConfig {
        transition_policy: TransitionPolicy::Permissive,
        ..BoardwiseConfig::default()
    };
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let dispatcher = BoardingDispatcher::from_config(InMemorySnapshotStore::new(), bus, &config);
    dispatcher.register(open_list(1)).unwrap();

    dispatcher.dispatch(LIST, &board(1)).unwrap();
    let reverted = dispatcher
        .dispatch(
            LIST,
            &BoardingCommand::update_status(pid(1), BoardingStatus::WaitForBoarding),
        )
        .unwrap();
    assert_eq!(reverted.current, open_list(1));
}

#[test]
fn strict_policy_rejects_changing_a_boarded_passenger() {
    let (dispatcher, _sub) = setup(1);
    dispatcher.dispatch(LIST, &board(1)).unwrap();

    let err = dispatcher
        .dispatch(
            LIST,
            &BoardingCommand::update_status(pid(1), BoardingStatus::NoShow),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Domain(DomainError::InvalidTransition(_))
    ));
}

#[test]
fn registering_the_same_list_twice_conflicts() {
    let (dispatcher, _sub) = setup(1);
    let err = dispatcher.register(open_list(1)).unwrap_err();
    assert!(matches!(err, DispatchError::Store(StoreError::Concurrency(_))));
}

/// Lets a rival writer mark `rival` as a no-show just before each of the
/// first `races` guarded saves.
struct RacingStore {
    inner: InMemorySnapshotStore<BoardingList>,
    races: AtomicU32,
    rival: PassengerId,
}

impl SnapshotStore<BoardingList> for RacingStore {
    fn load(&self, id: &BoardingListId) -> Result<Option<Versioned<BoardingList>>, StoreError> {
        self.inner.load(id)
    }

    fn save(&self, snapshot: BoardingList, expected: ExpectedVersion) -> Result<u64, StoreError> {
        if matches!(expected, ExpectedVersion::Exact(_))
            && self
                .races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            let stored = self.inner.load(snapshot.id())?.expect("registered list");
            let rival =
                update_boarding_status(&stored.snapshot, self.rival, BoardingStatus::NoShow)
                    .expect("rival transition");
            self.inner
                .save(rival, ExpectedVersion::Exact(stored.version))?;
        }
        self.inner.save(snapshot, expected)
    }
}

#[test]
fn lost_race_is_replayed_on_the_latest_snapshot() {
    let store = RacingStore {
        inner: InMemorySnapshotStore::new(),
        races: AtomicU32::new(1),
        rival: pid(2),
    };
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let sub = bus.subscribe();
    let dispatcher = BoardingDispatcher::new(store, bus);
    dispatcher.register(open_list(2)).unwrap();

    let outcome = dispatcher.dispatch(LIST, &board(1)).unwrap();

    // Version 2 is the rival's write; ours lands on top of it.
    assert_eq!(outcome.version, 3);
    assert_eq!(
        outcome.current.entry(pid(1)).map(|e| e.status()),
        Some(BoardingStatus::Boarded)
    );
    assert_eq!(
        outcome.current.entry(pid(2)).map(|e| e.status()),
        Some(BoardingStatus::NoShow)
    );
    // Only the change we made is published; the rival publishes its own.
    let published = sub.drain();
    assert_eq!(published.len(), 1);
    match published[0].payload() {
        BoardingEvent::StatusChanged(e) => assert_eq!(e.passenger_id, pid(1)),
        other => panic!("expected StatusChanged, got {other:?}"),
    }
}

#[test]
fn retries_are_bounded() {
    let config = BoardwiseConfig {
        max_conflict_retries: 2,
        ..BoardwiseConfig::default()
    };
    let store = RacingStore {
        inner: InMemorySnapshotStore::new(),
        races: AtomicU32::new(u32::MAX),
        rival: pid(2),
    };
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let dispatcher = BoardingDispatcher::from_config(store, bus, &config);
    dispatcher.register(open_list(2)).unwrap();

    let err = dispatcher.dispatch(LIST, &board(1)).unwrap_err();
    assert!(matches!(err, DispatchError::RetriesExhausted { attempts: 3 }));
}

#[test]
fn concurrent_disjoint_updates_all_land() {
    const PASSENGERS: u64 = 16;

    let config = BoardwiseConfig {
        max_conflict_retries: 1_000,
        ..BoardwiseConfig::default()
    };
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let sub = bus.subscribe();
    let dispatcher = Arc::new(BoardingDispatcher::from_config(
        InMemorySnapshotStore::new(),
        bus,
        &config,
    ));
    dispatcher.register(open_list(PASSENGERS)).unwrap();

    let handles: Vec<_> = (1..=PASSENGERS)
        .map(|n| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || dispatcher.dispatch(LIST, &board(n)).map(|o| o.version))
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked").unwrap();
    }

    let stored = dispatcher.current(LIST).unwrap();
    assert_eq!(stored.version, PASSENGERS + 1);
    assert!(!stored.snapshot.has_waiting());
    assert_eq!(sub.drain().len(), PASSENGERS as usize);

    let closed = dispatcher.dispatch(LIST, &BoardingCommand::close()).unwrap();
    assert!(closed.current.is_completed());
}

struct FailingBus;

impl EventBus<EventEnvelope<BoardingEvent>> for FailingBus {
    type Error = &'static str;

    fn publish(&self, _message: EventEnvelope<BoardingEvent>) -> Result<(), Self::Error> {
        Err("broker unavailable")
    }

    fn subscribe(&self) -> Subscription<EventEnvelope<BoardingEvent>> {
        let (_tx, rx) = mpsc::channel();
        Subscription::new(rx)
    }
}

#[test]
fn publish_failure_is_reported_after_the_snapshot_is_saved() {
    let dispatcher = BoardingDispatcher::new(InMemorySnapshotStore::new(), FailingBus);
    dispatcher.register(open_list(1)).unwrap();

    let err = dispatcher.dispatch(LIST, &board(1)).unwrap_err();
    match err {
        DispatchError::Publish { version, undelivered, reason } => {
            assert_eq!(version, 2);
            assert_eq!(undelivered.len(), 1);
            assert!(reason.contains("broker unavailable"));
        }
        other => panic!("expected Publish, got {other:?}"),
    }

    let stored = dispatcher.current(LIST).unwrap();
    assert_eq!(stored.version, 2);
    assert!(!stored.snapshot.has_waiting());
}

/// Rejects the first `failures` publishes, then forwards to an in-memory bus.
struct FlakyBus {
    failures: AtomicU32,
    inner: InMemoryEventBus<EventEnvelope<BoardingEvent>>,
}

impl FlakyBus {
    fn failing(failures: u32) -> Self {
        Self {
            failures: AtomicU32::new(failures),
            inner: InMemoryEventBus::new(),
        }
    }
}

impl EventBus<EventEnvelope<BoardingEvent>> for FlakyBus {
    type Error = String;

    fn publish(&self, message: EventEnvelope<BoardingEvent>) -> Result<(), Self::Error> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err("broker blip".to_string());
        }
        self.inner.publish(message).map_err(|e| format!("{e:?}"))
    }

    fn subscribe(&self) -> Subscription<EventEnvelope<BoardingEvent>> {
        self.inner.subscribe()
    }
}

#[test]
fn undelivered_events_survive_a_publish_failure() -> anyhow::Result<()> {
    let bus = Arc::new(FlakyBus::failing(1));
    let sub = bus.subscribe();
    let dispatcher = BoardingDispatcher::new(InMemorySnapshotStore::new(), Arc::clone(&bus));
    dispatcher.register(open_list(2))?;

    let undelivered = match dispatcher.dispatch(LIST, &board(1)) {
        Err(DispatchError::Publish { undelivered, .. }) => undelivered,
        other => panic!("expected Publish, got {other:?}"),
    };
    assert!(sub.drain().is_empty());

    // The snapshot already moved, so the same command has nothing left to publish.
    let repeat = dispatcher.dispatch(LIST, &board(1))?;
    assert!(repeat.events.is_empty());

    dispatcher.republish(undelivered)?;
    let delivered = sub.drain();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].sequence_number(), 2);
    match delivered[0].payload() {
        BoardingEvent::StatusChanged(e) => {
            assert_eq!(e.passenger_id, pid(1));
            assert_eq!(e.new_status, BoardingStatus::Boarded);
        }
        other => panic!("expected StatusChanged, got {other:?}"),
    }
    Ok(())
}

#[test]
fn republish_failure_keeps_the_remaining_envelopes() {
    let bus = Arc::new(FlakyBus::failing(2));
    let dispatcher = BoardingDispatcher::new(InMemorySnapshotStore::new(), Arc::clone(&bus));
    dispatcher.register(open_list(1)).unwrap();

    let undelivered = match dispatcher.dispatch(LIST, &board(1)) {
        Err(DispatchError::Publish { undelivered, .. }) => undelivered,
        other => panic!("expected Publish, got {other:?}"),
    };

    match dispatcher.republish(undelivered.clone()) {
        Err(DispatchError::Publish { version, undelivered: left, .. }) => {
            assert_eq!(version, 2);
            assert_eq!(left, undelivered);
        }
        other => panic!("expected Publish, got {other:?}"),
    }

    let sub = bus.subscribe();
    dispatcher.republish(undelivered).unwrap();
    assert_eq!(sub.drain().len(), 1);
}
