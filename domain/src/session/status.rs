//! Session state machine.
//!
//! ```text
//! draft ──start──▶ running ──complete──▶ completed
//!                     │
//!                     └────cancel────▶ cancelled
//! ```
//!
//! `completed` and `cancelled` are terminal. Any other (status, event) pair
//! is rejected with [`DomainError::InvalidTransition`] and the status is left
//! as it was.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Draft,
    Running,
    Completed,
    Cancelled,
}

/// Requests that drive the session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionEvent {
    /// Start request (orchestrator)
    Start,
    /// All rounds and synthesis done (orchestrator)
    Complete,
    /// User cancellation (external)
    Cancel,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Draft => "draft",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    /// Apply `event`, returning the next status.
    pub fn transition(self, event: SessionEvent) -> Result<SessionStatus, DomainError> {
        match (self, event) {
            (SessionStatus::Draft, SessionEvent::Start) => Ok(SessionStatus::Running),
            (SessionStatus::Running, SessionEvent::Complete) => Ok(SessionStatus::Completed),
            (SessionStatus::Running, SessionEvent::Cancel) => Ok(SessionStatus::Cancelled),
            (from, event) => Err(DomainError::InvalidTransition { from, event }),
        }
    }

    pub fn can_apply(self, event: SessionEvent) -> bool {
        self.transition(event).is_ok()
    }
}

impl SessionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionEvent::Start => "start",
            SessionEvent::Complete => "complete",
            SessionEvent::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [SessionStatus; 4] = [
        SessionStatus::Draft,
        SessionStatus::Running,
        SessionStatus::Completed,
        SessionStatus::Cancelled,
    ];

    const ALL_EVENTS: [SessionEvent; 3] = [
        SessionEvent::Start,
        SessionEvent::Complete,
        SessionEvent::Cancel,
    ];

    #[test]
    fn test_legal_transitions() {
        assert_eq!(
            SessionStatus::Draft.transition(SessionEvent::Start),
            Ok(SessionStatus::Running)
        );
        assert_eq!(
            SessionStatus::Running.transition(SessionEvent::Complete),
            Ok(SessionStatus::Completed)
        );
        assert_eq!(
            SessionStatus::Running.transition(SessionEvent::Cancel),
            Ok(SessionStatus::Cancelled)
        );
    }

    #[test]
    fn test_exactly_three_legal_transitions() {
        let legal = ALL_STATUSES
            .iter()
            .flat_map(|s| ALL_EVENTS.iter().map(move |e| (*s, *e)))
            .filter(|(s, e)| s.can_apply(*e))
            .count();
        assert_eq!(legal, 3);
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for status in [SessionStatus::Completed, SessionStatus::Cancelled] {
            assert!(status.is_terminal());
            for event in ALL_EVENTS {
                let err = status.transition(event).unwrap_err();
                assert_eq!(err, DomainError::InvalidTransition { from: status, event });
            }
        }
    }

    #[test]
    fn test_draft_cannot_be_cancelled_or_completed() {
        assert!(SessionStatus::Draft.transition(SessionEvent::Cancel).is_err());
        assert!(SessionStatus::Draft.transition(SessionEvent::Complete).is_err());
    }

    #[test]
    fn test_running_cannot_restart() {
        assert!(SessionStatus::Running.transition(SessionEvent::Start).is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Cancelled).unwrap(),
            r#""cancelled""#
        );
        let status: SessionStatus = serde_json::from_str(r#""running""#).unwrap();
        assert_eq!(status, SessionStatus::Running);
    }
}
