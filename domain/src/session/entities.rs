//! Session domain entities

use super::status::{SessionEvent, SessionStatus};
use crate::agent::entities::AgentSettings;
use crate::core::error::DomainError;
use crate::core::ids::{AgentId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum number of agents for a runnable session.
pub const MIN_AGENTS: usize = 2;

/// Identity and rendering fields of an agent, frozen when the session was created.
///
/// The order of snapshots in a session is the agent visiting order for
/// every round. `settings` is filled in when the session starts running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<AgentSettings>,
}

impl AgentSnapshot {
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            settings: None,
        }
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// One agent's contribution within one round (Entity)
///
/// Immutable once appended to a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub content: String,
    /// 1-indexed round number
    pub round: u32,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        agent_id: impl Into<AgentId>,
        agent_name: impl Into<String>,
        content: impl Into<String>,
        round: u32,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            content: content.into(),
            round,
            timestamp: Utc::now(),
        }
    }
}

/// How a start request proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// `draft` session: transition to `running` and begin at round 1
    Fresh,
    /// Already `running`: continue after the last fully visited round
    Resume { from_round: u32 },
}

/// A deliberation run over a topic (Entity)
///
/// Created in `draft` by the administrative layer. Only the orchestrator
/// moves it to `running`, appends turns, advances `current_round` and
/// completes it; only a user cancellation moves it to `cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub topic: String,
    #[serde(default)]
    pub objective: Option<String>,
    pub agent_snapshots: Vec<AgentSnapshot>,
    pub max_rounds: u32,
    /// Last fully visited round (0 before the first round finishes)
    #[serde(default)]
    pub current_round: u32,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub transcript: Vec<Turn>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a `draft` session.
    pub fn new(
        id: impl Into<SessionId>,
        topic: impl Into<String>,
        agent_snapshots: Vec<AgentSnapshot>,
        max_rounds: u32,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            objective: None,
            agent_snapshots,
            max_rounds,
            current_round: 0,
            status: SessionStatus::Draft,
            transcript: Vec::new(),
            action_items: Vec::new(),
            completed_at: None,
        }
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = Some(objective.into());
        self
    }

    /// Validate that the session can run at all.
    pub fn validate_runnable(&self) -> Result<(), DomainError> {
        if self.agent_snapshots.len() < MIN_AGENTS {
            return Err(DomainError::InsufficientAgents {
                required: MIN_AGENTS,
                found: self.agent_snapshots.len(),
            });
        }
        if self.max_rounds == 0 {
            return Err(DomainError::InvalidSession(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        if self.current_round > self.max_rounds {
            return Err(DomainError::InvalidSession(format!(
                "current_round {} exceeds max_rounds {}",
                self.current_round, self.max_rounds
            )));
        }
        Ok(())
    }

    /// Decide how a start request proceeds without changing the session.
    ///
    /// A `draft` session starts fresh; a `running` one is resumed. Anything
    /// else is an invalid transition.
    pub fn plan_start(&self) -> Result<StartMode, DomainError> {
        let mode = match self.status {
            SessionStatus::Running => StartMode::Resume {
                from_round: self.current_round + 1,
            },
            status => {
                status.transition(SessionEvent::Start)?;
                StartMode::Fresh
            }
        };
        self.validate_runnable()?;
        Ok(mode)
    }

    /// Number of turns a fully successful run would produce.
    pub fn expected_turns(&self) -> usize {
        self.max_rounds as usize * self.agent_snapshots.len()
    }

    /// Turns recorded for `round`, in append order.
    pub fn turns_in_round(&self, round: u32) -> impl Iterator<Item = &Turn> {
        self.transcript.iter().filter(move |t| t.round == round)
    }

    /// Whether fewer turns were recorded than a fully successful run would produce.
    pub fn is_partial(&self) -> bool {
        self.transcript.len() < self.expected_turns()
    }
}
