//! Domain error types

use crate::session::status::{SessionEvent, SessionStatus};
use thiserror::Error;

/// Domain-level errors
///
/// Every variant is a precondition violation: the operation is rejected
/// and the entity it was applied to is left unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Cannot {event} a session that is {from}")]
    InvalidTransition {
        from: SessionStatus,
        event: SessionEvent,
    },

    #[error("A session needs at least {required} agents, found {found}")]
    InsufficientAgents { required: usize, found: usize },

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    #[error("Invalid provider profile: {0}")]
    InvalidProvider(String),
}

impl DomainError {
    /// Check if this error is a rejected state transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, DomainError::InvalidTransition { .. })
    }
}
