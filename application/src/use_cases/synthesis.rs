//! Synthesis step
//!
//! Condenses a finished transcript into a short list of action items with a
//! single provider call. Failure here never fails the session.

use super::shared::ProviderInvoker;
use crate::config::{RetryPolicy, SynthesisParams};
use crate::ports::provider_client::{CompletionRequest, ProviderClient, ProviderError};
use roundtable_domain::{Message, PromptTemplate, ProviderProfile, Turn, parse_action_items};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    Items(Vec<String>),
    /// The transcript was empty; no call was made
    Skipped,
    /// The reply contained no recognizable list
    Unparseable,
    Failed(ProviderError),
}

impl SynthesisOutcome {
    /// Action items to record. Every non-success outcome records none.
    pub fn into_items(self) -> Vec<String> {
        match self {
            SynthesisOutcome::Items(items) => items,
            _ => Vec::new(),
        }
    }
}

pub struct SynthesisStep<P: ?Sized> {
    invoker: ProviderInvoker<P>,
    profile: ProviderProfile,
    params: SynthesisParams,
}

impl<P: ProviderClient + ?Sized> SynthesisStep<P> {
    pub fn new(
        provider: Arc<P>,
        profile: ProviderProfile,
        retry: RetryPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            invoker: ProviderInvoker::new(provider, retry, call_timeout),
            profile,
            params: SynthesisParams::default(),
        }
    }

    pub fn with_params(mut self, params: SynthesisParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.invoker = self.invoker.with_cancellation(token);
        self
    }

    pub async fn run(&self, topic: &str, transcript: &[Turn]) -> SynthesisOutcome {
        if transcript.is_empty() {
            return SynthesisOutcome::Skipped;
        }

        let request = CompletionRequest::new(
            PromptTemplate::synthesis_system(),
            vec![Message::user(PromptTemplate::synthesis_prompt(topic, transcript))],
        )
        .with_temperature(self.params.temperature)
        .with_max_tokens(self.params.max_tokens);

        let reply = match self.invoker.invoke(&self.profile, &request).await {
            Ok(reply) => reply,
            Err(failure) => {
                warn!("Synthesis failed: {}", failure.error);
                return SynthesisOutcome::Failed(failure.error);
            }
        };

        match parse_action_items(&reply) {
            Some(items) => {
                info!("Synthesis produced {} action item(s)", items.len());
                SynthesisOutcome::Items(items)
            }
            None => {
                warn!("Synthesis reply contained no action item list");
                SynthesisOutcome::Unparseable
            }
        }
    }
}
