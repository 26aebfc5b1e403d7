//! Port for structured deliberation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording deliberation events
//! (turns appended or skipped, empty rounds, synthesis, completion) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the run in a
//! machine-readable format (JSONL).

use roundtable_domain::{Participant, SessionId, SessionStatus, Turn};
use serde_json::{Value, json};

/// A structured deliberation event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The adapter adds the timestamp.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "turn_appended", "synthesis_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn session_started(session_id: &SessionId, participants: &[Participant], from_round: u32) -> Self {
        Self::new(
            "session_started",
            json!({
                "session_id": session_id,
                "agents": participants.iter().map(|p| &p.name).collect::<Vec<_>>(),
                "from_round": from_round,
            }),
        )
    }

    pub fn turn_appended(session_id: &SessionId, turn: &Turn) -> Self {
        Self::new(
            "turn_appended",
            json!({
                "session_id": session_id,
                "round": turn.round,
                "agent": turn.agent_name,
                "bytes": turn.content.len(),
                "text": turn.content,
            }),
        )
    }

    pub fn turn_failed(session_id: &SessionId, round: u32, agent: &Participant, error: &str) -> Self {
        Self::new(
            "turn_failed",
            json!({
                "session_id": session_id,
                "round": round,
                "agent": agent.name,
                "error": error,
            }),
        )
    }

    pub fn round_empty(session_id: &SessionId, round: u32) -> Self {
        Self::new(
            "round_empty",
            json!({ "session_id": session_id, "round": round }),
        )
    }

    pub fn synthesis_completed(session_id: &SessionId, action_items: &[String]) -> Self {
        Self::new(
            "synthesis_completed",
            json!({ "session_id": session_id, "action_items": action_items }),
        )
    }

    pub fn synthesis_failed(session_id: &SessionId, reason: &str) -> Self {
        Self::new(
            "synthesis_failed",
            json!({ "session_id": session_id, "reason": reason }),
        )
    }

    pub fn session_finished(session_id: &SessionId, status: SessionStatus, turns: usize) -> Self {
        let event_type = match status {
            SessionStatus::Cancelled => "session_cancelled",
            _ => "session_completed",
        };
        Self::new(
            event_type,
            json!({ "session_id": session_id, "status": status, "turns": turns }),
        )
    }
}

/// Port for logging deliberation events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// The `log` method is synchronous and non-fallible so it never disrupts
/// the round loop; logging failures are silently ignored.
pub trait ConversationLogger: Send + Sync {
    /// Record a deliberation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
