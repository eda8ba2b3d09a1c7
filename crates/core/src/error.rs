//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic business failure. Nothing here is caused by
/// IO, so none of these are worth retrying as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The referenced entity does not exist inside the aggregate.
    #[error("not found: {0}")]
    NotFound(String),

    /// An argument was outside its allowed domain (e.g. unknown status value).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The aggregate is closed and accepts no further transitions.
    #[error("aggregate closed: {0}")]
    ClosedAggregate(String),

    /// A domain invariant would be violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An entity-level state transition is not permitted.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Stale version / optimistic concurrency failure.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Stable, distinct classification of a [`DomainError`].
///
/// Outer layers map on this rather than on message text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    ClosedAggregate,
    InvariantViolation,
    InvalidTransition,
    InvalidId,
    Conflict,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::ClosedAggregate => "closed_aggregate",
            ErrorKind::InvariantViolation => "invariant_violation",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::InvalidId => "invalid_id",
            ErrorKind::Conflict => "conflict",
        }
    }
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn closed(msg: impl Into<String>) -> Self {
        Self::ClosedAggregate(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DomainError::ClosedAggregate(_) => ErrorKind::ClosedAggregate,
            DomainError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            DomainError::InvalidTransition(_) => ErrorKind::InvalidTransition,
            DomainError::InvalidId(_) => ErrorKind::InvalidId,
            DomainError::Conflict(_) => ErrorKind::Conflict,
        }
    }
}
