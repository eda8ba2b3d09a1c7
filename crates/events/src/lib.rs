//! Domain events and the mechanics for distributing them.
//!
//! Domain crates describe *what* happened (`Event`); this crate wraps those
//! facts with stream metadata (`EventEnvelope`) and fans them out to
//! subscribers (`EventBus`). It makes no storage assumptions.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
