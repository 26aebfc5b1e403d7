//! Agent entities

use crate::core::error::DomainError;
use crate::core::ids::{AgentId, ProviderId};
use crate::providers::profile::ProviderProfile;
use serde::{Deserialize, Serialize};

/// A configured LLM persona (Entity)
///
/// Created and edited by the administrative layer. A running session never
/// reads an `Agent` directly; it works from a [`Participant`] snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub system_prompt: String,
    /// Sampling temperature in `0.0..=1.0`
    pub temperature: f32,
    /// `None` means "unlimited"
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// `None` means "use the platform default provider"
    #[serde(default)]
    pub provider_ref: Option<ProviderId>,
}

impl Agent {
    pub fn new(
        id: impl Into<AgentId>,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            system_prompt: system_prompt.into(),
            temperature: 0.7,
            max_tokens: None,
            provider_ref: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<ProviderId>) -> Self {
        self.provider_ref = Some(provider.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.settings().validate(&self.name)
    }

    /// The fields a session freezes when it starts running.
    pub fn settings(&self) -> AgentSettings {
        AgentSettings {
            system_prompt: self.system_prompt.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            provider_ref: self.provider_ref.clone(),
        }
    }
}

/// Agent fields copied onto a session when it moves to `running`.
///
/// A resumed run reads these instead of the live [`Agent`], so edits made
/// while the session is running only affect later sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    pub system_prompt: String,
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub provider_ref: Option<ProviderId>,
}

impl AgentSettings {
    /// `name` is only used in the error message.
    pub fn validate(&self, name: &str) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DomainError::InvalidAgent(format!(
                "agent '{}' has temperature {} outside 0.0..=1.0",
                name, self.temperature
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(DomainError::InvalidAgent(format!(
                "agent '{}' has a zero token cap",
                name
            )));
        }
        Ok(())
    }
}

/// An agent frozen for the duration of one deliberation run.
///
/// Holds everything a turn needs, with the provider reference already
/// resolved, so later edits to the stored agent cannot change a run in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: AgentId,
    pub name: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub provider: ProviderProfile,
}

impl Participant {
    pub fn new(
        id: impl Into<AgentId>,
        name: impl Into<String>,
        settings: &AgentSettings,
        provider: ProviderProfile,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            system_prompt: settings.system_prompt.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            provider,
        }
    }

    /// Freeze `agent` together with the provider profile it resolves to.
    pub fn from_agent(agent: &Agent, provider: ProviderProfile) -> Self {
        Self::new(agent.id.clone(), agent.name.clone(), &agent.settings(), provider)
    }
}
