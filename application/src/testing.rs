//! Test doubles shared by the use case tests.

use crate::ports::provider_client::{CompletionRequest, ProviderClient, ProviderError};
use crate::ports::session_store::{SessionStore, SessionUpdate, StoreError};
use async_trait::async_trait;
use roundtable_domain::{
    Agent, AgentId, AgentSnapshot, PromptTemplate, ProviderId, ProviderKind, ProviderProfile,
    Session, SessionId, SessionStatus, Turn,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;

type Responder = dyn Fn(&CompletionRequest, usize) -> Result<String, ProviderError> + Send + Sync;

/// Provider whose replies come from a closure over the request and the
/// zero-based index of the call.
pub(crate) struct ScriptedProvider {
    responder: Box<Responder>,
    delay: Option<Duration>,
    delays: HashMap<String, Duration>,
    requests: Mutex<Vec<(ProviderProfile, CompletionRequest)>>,
}

impl ScriptedProvider {
    pub fn new(
        responder: impl Fn(&CompletionRequest, usize) -> Result<String, ProviderError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            delays: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every agent speaks; synthesis returns three action items.
    pub fn cooperative() -> Self {
        Self::new(|request, _| {
            if is_synthesis(request) {
                Ok(r#"["Draft the proposal", "Review costs", "Schedule a follow-up"]"#.to_string())
            } else {
                Ok(format!("{} speaks", request.system_prompt))
            }
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay replies for the agent with the given system prompt.
    pub fn with_delay_for(mut self, system_prompt: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(system_prompt.into(), delay);
        self
    }

    pub fn requests(&self) -> Vec<(ProviderProfile, CompletionRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn turn_calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r)| !is_synthesis(r))
            .count()
    }

    pub fn synthesis_calls(&self) -> usize {
        self.total_calls() - self.turn_calls()
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn complete(
        &self,
        profile: &ProviderProfile,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((profile.clone(), request.clone()));
            requests.len() - 1
        };

        if let Some(delay) = self.delays.get(&request.system_prompt).or(self.delay.as_ref()) {
            tokio::time::sleep(*delay).await;
        }
        (self.responder)(request, index)
    }
}

pub(crate) fn is_synthesis(request: &CompletionRequest) -> bool {
    request.system_prompt == PromptTemplate::synthesis_system()
}

pub(crate) fn agent_prompt(index: usize) -> String {
    format!("You are Agent {}.", index)
}

pub(crate) fn is_agent(request: &CompletionRequest, index: usize) -> bool {
    request.system_prompt == agent_prompt(index)
}

pub(crate) fn is_round(request: &CompletionRequest, round: u32) -> bool {
    request
        .messages
        .iter()
        .any(|m| m.content.contains(&format!("round {} of", round)))
}

pub(crate) fn default_profile() -> ProviderProfile {
    ProviderProfile::new(ProviderKind::OpenAi, "sk-default")
}

/// Record store kept in memory behind a mutex.
#[derive(Default)]
pub(crate) struct MemoryStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
    agents: Mutex<HashMap<AgentId, Agent>>,
    providers: Mutex<HashMap<ProviderId, ProviderProfile>>,
}

impl MemoryStore {
    /// A draft session over `agents` agents named "Agent 0", "Agent 1", ...
    pub fn with_draft_session(agents: usize, max_rounds: u32) -> (Arc<Self>, SessionId) {
        let store = Self::default();
        let mut snapshots = Vec::new();
        for i in 0..agents {
            let agent = Agent::new(format!("agent-{}", i), format!("Agent {}", i), agent_prompt(i));
            snapshots.push(AgentSnapshot::new(agent.id.clone(), agent.name.clone()));
            store.insert_agent(agent);
        }
        let session = Session::new("session-1", "Should we adopt a four-day week?", snapshots, max_rounds);
        let id = session.id.clone();
        store.insert_session(session);
        (Arc::new(store), id)
    }

    pub fn with_running_session(agents: usize, max_rounds: u32) -> (Arc<Self>, SessionId) {
        let (store, id) = Self::with_draft_session(agents, max_rounds);
        store.modify(&id, |s| s.status = SessionStatus::Running);
        (store, id)
    }

    pub fn insert_session(&self, session: Session) {
        self.sessions.lock().unwrap().insert(session.id.clone(), session);
    }

    pub fn insert_agent(&self, agent: Agent) {
        self.agents.lock().unwrap().insert(agent.id.clone(), agent);
    }

    pub fn remove_agent(&self, id: &AgentId) {
        self.agents.lock().unwrap().remove(id);
    }

    pub fn insert_provider(&self, id: impl Into<ProviderId>, profile: ProviderProfile) {
        self.providers.lock().unwrap().insert(id.into(), profile);
    }

    pub fn session(&self, id: &SessionId) -> Session {
        self.sessions.lock().unwrap()[id].clone()
    }

    pub fn modify(&self, id: &SessionId, f: impl FnOnce(&mut Session)) {
        f(self.sessions.lock().unwrap().get_mut(id).unwrap());
    }

    pub fn cancel_now(&self, id: &SessionId) {
        self.modify(id, |s| s.status = SessionStatus::Cancelled);
    }

    pub fn push_turn(&self, id: &SessionId, turn: Turn) {
        self.modify(id, |s| s.transcript.push(turn));
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::session_not_found(id))
    }

    async fn get_agents(&self, ids: &[AgentId]) -> Result<Vec<Agent>, StoreError> {
        let agents = self.agents.lock().unwrap();
        Ok(ids.iter().filter_map(|id| agents.get(id).cloned()).collect())
    }

    async fn get_provider(&self, id: &ProviderId) -> Result<ProviderProfile, StoreError> {
        self.providers
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::provider_not_found(id))
    }

    async fn update_session(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::session_not_found(id))?;
        update.apply_to(session)?;
        Ok(session.clone())
    }
}
