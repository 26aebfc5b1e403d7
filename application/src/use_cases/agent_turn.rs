//! Agent turn executor
//!
//! Produces one agent's contribution for one round: builds the turn prompt
//! from the topic and the bounded prior context, calls the agent's provider
//! and wraps the reply in a [`Turn`].

use super::shared::{CallFailure, ProviderInvoker};
use crate::config::RetryPolicy;
use crate::ports::provider_client::{CompletionRequest, ProviderClient, ProviderError};
use roundtable_domain::{Message, Participant, PromptTemplate, Turn, TurnPromptContext};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a turn produced no contribution.
///
/// A turn error never aborts the session; the orchestrator skips the turn.
#[derive(Error, Debug, Clone)]
pub enum TurnError {
    #[error("{agent} failed after {attempts} attempt(s): {source}")]
    Provider {
        agent: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    #[error("{agent} returned an empty response")]
    EmptyResponse { agent: String },

    #[error("{agent}'s turn task ended without a result")]
    Aborted { agent: String },
}

impl TurnError {
    pub fn category(&self) -> &'static str {
        match self {
            TurnError::Provider { source, .. } => source.category(),
            TurnError::EmptyResponse { .. } => "empty_response",
            TurnError::Aborted { .. } => "aborted",
        }
    }
}

/// Everything a turn needs besides the participant.
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub topic: &'a str,
    pub objective: Option<&'a str>,
    pub round: u32,
    pub max_rounds: u32,
    /// Already bounded by the context window
    pub prior_turns: &'a [Turn],
}

pub struct AgentTurnExecutor<P: ?Sized> {
    invoker: ProviderInvoker<P>,
}

impl<P: ProviderClient + ?Sized> AgentTurnExecutor<P> {
    pub fn new(provider: Arc<P>, retry: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            invoker: ProviderInvoker::new(provider, retry, call_timeout),
        }
    }

    pub fn with_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.invoker = self.invoker.with_cancellation(token);
        self
    }

    /// Build the request a participant sends for a turn.
    pub fn build_request(participant: &Participant, input: &TurnInput<'_>) -> CompletionRequest {
        let prompt = PromptTemplate::turn_prompt(&TurnPromptContext {
            topic: input.topic,
            objective: input.objective,
            round: input.round,
            max_rounds: input.max_rounds,
            prior_turns: input.prior_turns,
        });

        CompletionRequest::new(participant.system_prompt.clone(), vec![Message::user(prompt)])
            .with_temperature(participant.temperature)
            .with_max_tokens(participant.max_tokens)
    }

    pub async fn execute(
        &self,
        participant: &Participant,
        input: &TurnInput<'_>,
    ) -> Result<Turn, TurnError> {
        let request = Self::build_request(participant, input);

        let content = self
            .invoker
            .invoke(&participant.provider, &request)
            .await
            .map_err(|CallFailure { error, attempts }| TurnError::Provider {
                agent: participant.name.clone(),
                attempts,
                source: error,
            })?;

        if content.trim().is_empty() {
            return Err(TurnError::EmptyResponse {
                agent: participant.name.clone(),
            });
        }

        Ok(Turn::new(
            participant.id.clone(),
            participant.name.clone(),
            content,
            input.round,
        ))
    }
}
