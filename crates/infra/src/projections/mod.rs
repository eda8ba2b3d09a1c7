//! Projection implementations (read model builders).
//!
//! Projections consume published boarding events and are:
//! - **Rebuildable**: can be reconstructed by replaying envelopes
//! - **Idempotent**: safe for at-least-once delivery

pub mod boarding_progress;

pub use boarding_progress::{
    BoardingProgressError, BoardingProgressProjection, FlightBoardingProgress,
};
