//! Provider client port
//!
//! Defines the uniform interface to heterogeneous chat-completion backends.
//! Adapters map each [`ProviderKind`](roundtable_domain::ProviderKind) to its
//! own wire shape; callers never branch on the provider kind.

use async_trait::async_trait;
use roundtable_domain::{Message, ProviderProfile};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a provider call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Rate limited by provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Payment required: {0}")]
    PaymentRequired(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid provider profile: {0}")]
    InvalidProfile(String),
}

impl ProviderError {
    /// Whether the failure is transient and the call may be retried.
    ///
    /// Authentication, payment, malformed responses and rejected requests
    /// fail the same way every time and are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. }
                | ProviderError::Transport(_)
                | ProviderError::Timeout(_)
                | ProviderError::Server { .. }
        )
    }

    /// Server-provided minimum wait before retrying, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Short category name for logs and structured events.
    pub fn category(&self) -> &'static str {
        match self {
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::PaymentRequired(_) => "payment_required",
            ProviderError::Authentication(_) => "authentication",
            ProviderError::MalformedResponse(_) => "malformed_response",
            ProviderError::Transport(_) => "transport",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Server { .. } => "server",
            ProviderError::Rejected { .. } => "rejected",
            ProviderError::InvalidProfile(_) => "invalid_profile",
        }
    }
}

/// A single chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<Message>,
    /// Passed through unmodified
    pub temperature: f32,
    /// `None` means "unlimited"; adapters for backends that require a cap
    /// substitute their own default
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Uniform chat-completion client
///
/// Implementations (adapters) live in the infrastructure layer. A call has
/// no side effect beyond the outbound request.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Send `request` to the backend described by `profile` and return the reply text.
    async fn complete(
        &self,
        profile: &ProviderProfile,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError>;
}
