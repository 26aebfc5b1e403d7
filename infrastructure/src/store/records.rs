//! The record document shared by the store adapters.

use roundtable_application::{SessionUpdate, StoreError};
use roundtable_domain::{Agent, AgentId, ProviderId, ProviderProfile, Session, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every record the deliberation core reads, keyed by id.
///
/// Serialized as `{"sessions": {...}, "agents": {...}, "providers": {...}}`
/// with camelCase record fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreRecords {
    pub sessions: BTreeMap<SessionId, Session>,
    pub agents: BTreeMap<AgentId, Agent>,
    pub providers: BTreeMap<ProviderId, ProviderProfile>,
}

impl StoreRecords {
    pub fn with_session(mut self, session: Session) -> Self {
        self.sessions.insert(session.id.clone(), session);
        self
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.insert(agent.id.clone(), agent);
        self
    }

    pub fn with_provider(mut self, id: impl Into<ProviderId>, profile: ProviderProfile) -> Self {
        self.providers.insert(id.into(), profile);
        self
    }

    pub fn session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.sessions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::session_not_found(id))
    }

    /// Agents with the given ids, in request order. Unknown ids are omitted.
    pub fn agents(&self, ids: &[AgentId]) -> Vec<Agent> {
        ids.iter()
            .filter_map(|id| self.agents.get(id).cloned())
            .collect()
    }

    pub fn provider(&self, id: &ProviderId) -> Result<ProviderProfile, StoreError> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::provider_not_found(id))
    }

    /// Apply `update` to a session. On error nothing changes.
    pub fn apply(&mut self, id: &SessionId, update: SessionUpdate) -> Result<Session, StoreError> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::session_not_found(id))?;
        update.apply_to(session)?;
        Ok(session.clone())
    }
}
