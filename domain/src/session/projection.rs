//! Read-only session projection for polling-based progress display.

use super::entities::{Session, Turn};
use super::status::SessionStatus;
use crate::core::ids::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a session's progress as seen by the UI.
///
/// Completeness is a data property: compare `transcript.len()` with
/// `expected_turns`. A partial run still reports `completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProjection {
    pub session_id: SessionId,
    pub topic: String,
    pub status: SessionStatus,
    pub current_round: u32,
    pub max_rounds: u32,
    pub transcript: Vec<Turn>,
    pub action_items: Vec<String>,
    pub expected_turns: usize,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionProjection {
    pub fn is_partial(&self) -> bool {
        self.transcript.len() < self.expected_turns
    }
}

impl From<&Session> for SessionProjection {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            topic: session.topic.clone(),
            status: session.status,
            current_round: session.current_round,
            max_rounds: session.max_rounds,
            transcript: session.transcript.clone(),
            action_items: session.action_items.clone(),
            expected_turns: session.expected_turns(),
            completed_at: session.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::entities::AgentSnapshot;

    #[test]
    fn test_projection_from_session() {
        let mut session = Session::new(
            "s1",
            "Hiring plan",
            vec![
                AgentSnapshot::new("a", "Alice"),
                AgentSnapshot::new("b", "Bob"),
                AgentSnapshot::new("c", "Carol"),
            ],
            2,
        );
        session.status = SessionStatus::Running;
        session.current_round = 1;
        session.transcript.push(Turn::new("a", "Alice", "hello", 1));

        let projection = SessionProjection::from(&session);
        assert_eq!(projection.status, SessionStatus::Running);
        assert_eq!(projection.current_round, 1);
        assert_eq!(projection.max_rounds, 2);
        assert_eq!(projection.expected_turns, 6);
        assert_eq!(projection.transcript[0].content, "hello");
        assert!(projection.is_partial());
    }
}
