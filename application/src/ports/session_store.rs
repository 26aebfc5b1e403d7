//! Session record store port
//!
//! The deliberation core treats persistence as an external keyed record
//! store. It reads sessions, agents and provider profiles, and writes
//! sessions through [`SessionUpdate`]s that the store applies atomically:
//! a concurrent reader sees either none or all of an update, never a
//! partially written turn.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roundtable_domain::{
    Agent, AgentId, AgentSnapshot, ProviderId, ProviderProfile, Session, SessionId,
    SessionStatus, Turn,
};
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Session is {actual}, expected {expected}")]
    StatusConflict {
        expected: SessionStatus,
        actual: SessionStatus,
    },

    /// Another writer appended turns since this one last read the session.
    #[error("Session transcript has {actual} turn(s), expected {expected}")]
    TranscriptConflict { expected: usize, actual: usize },

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn session_not_found(id: &SessionId) -> Self {
        StoreError::NotFound {
            entity: "session",
            id: id.to_string(),
        }
    }

    pub fn provider_not_found(id: &ProviderId) -> Self {
        StoreError::NotFound {
            entity: "provider",
            id: id.to_string(),
        }
    }

    /// The status the guard found, if this is a guard failure.
    pub fn conflicting_status(&self) -> Option<SessionStatus> {
        match self {
            StoreError::StatusConflict { actual, .. } => Some(*actual),
            _ => None,
        }
    }
}

/// Partial update of a session record.
///
/// Turns can only be appended, never replaced. When `require_status` is set
/// the whole update is rejected with [`StoreError::StatusConflict`] unless
/// the stored status matches, which lets the orchestrator and the external
/// cancellation path each stay the sole writer of their fields.
///
/// `require_turns` rejects the update with [`StoreError::TranscriptConflict`]
/// unless the stored transcript has exactly that many turns. Two runs that
/// race on one session can then never both append the same turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub require_status: Option<SessionStatus>,
    pub require_turns: Option<usize>,
    pub status: Option<SessionStatus>,
    pub agent_snapshots: Option<Vec<AgentSnapshot>>,
    pub append_turns: Vec<Turn>,
    pub current_round: Option<u32>,
    pub action_items: Option<Vec<String>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, status: SessionStatus) -> Self {
        self.require_status = Some(status);
        self
    }

    pub fn require_turns(mut self, count: usize) -> Self {
        self.require_turns = Some(count);
        self
    }

    pub fn status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace the snapshots, typically to freeze agent settings.
    pub fn agent_snapshots(mut self, snapshots: Vec<AgentSnapshot>) -> Self {
        self.agent_snapshots = Some(snapshots);
        self
    }

    pub fn append_turn(mut self, turn: Turn) -> Self {
        self.append_turns.push(turn);
        self
    }

    pub fn current_round(mut self, round: u32) -> Self {
        self.current_round = Some(round);
        self
    }

    pub fn action_items(mut self, items: Vec<String>) -> Self {
        self.action_items = Some(items);
        self
    }

    pub fn completed_at(mut self, at: DateTime<Utc>) -> Self {
        self.completed_at = Some(at);
        self
    }

    /// Apply the update to `session` in place.
    ///
    /// The guards are checked before anything is touched, so on error the
    /// session is unchanged. Store adapters call this under their own lock.
    pub fn apply_to(self, session: &mut Session) -> Result<(), StoreError> {
        if let Some(expected) = self.require_status
            && session.status != expected
        {
            return Err(StoreError::StatusConflict {
                expected,
                actual: session.status,
            });
        }
        if let Some(expected) = self.require_turns
            && session.transcript.len() != expected
        {
            return Err(StoreError::TranscriptConflict {
                expected,
                actual: session.transcript.len(),
            });
        }

        if let Some(status) = self.status {
            session.status = status;
        }
        if let Some(snapshots) = self.agent_snapshots {
            session.agent_snapshots = snapshots;
        }
        session.transcript.extend(self.append_turns);
        if let Some(round) = self.current_round {
            session.current_round = round;
        }
        if let Some(items) = self.action_items {
            session.action_items = items;
        }
        if let Some(at) = self.completed_at {
            session.completed_at = Some(at);
        }
        Ok(())
    }
}

/// Keyed record store consumed by the deliberation core
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_session(&self, id: &SessionId) -> Result<Session, StoreError>;

    /// Load the agents with the given ids. Unknown ids are omitted.
    async fn get_agents(&self, ids: &[AgentId]) -> Result<Vec<Agent>, StoreError>;

    async fn get_provider(&self, id: &ProviderId) -> Result<ProviderProfile, StoreError>;

    /// Atomically apply `update` and return the session as stored afterwards.
    async fn update_session(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError>;
}
