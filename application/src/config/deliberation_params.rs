//! Deliberation parameters: round loop and provider call control.
//!
//! [`DeliberationParams`] groups the static parameters that control the
//! round loop in [`RunDeliberationUseCase`](crate::use_cases::run_deliberation::RunDeliberationUseCase).
//! These are application-layer concerns, not domain policy.

use roundtable_domain::DEFAULT_CONTEXT_WINDOW;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy for a single provider call.
///
/// Only transient failures are retried (see `ProviderError::is_retryable`).
/// Backoff is exponential: `base_delay * 2^(attempt - 1)`, capped at
/// `max_delay`. A rate-limit `Retry-After` raises the wait to at least that
/// value, still capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        match retry_after {
            Some(hint) => delay.max(hint).min(self.max_delay),
            None => delay,
        }
    }
}

/// Sampling parameters for the synthesis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisParams {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: Some(1024),
        }
    }
}

/// Round loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationParams {
    /// Number of most recent turns shown to each agent.
    pub context_window: usize,
    /// Stop the session once this many consecutive rounds produced no turn
    /// while the transcript is still empty. `None` never stops early.
    pub empty_round_limit: Option<u32>,
    /// Fan out the provider calls of a round concurrently.
    pub concurrent_turns: bool,
    /// Upper bound on a single provider call attempt.
    pub call_timeout: Duration,
    pub retry: RetryPolicy,
    pub synthesis: SynthesisParams,
}

impl Default for DeliberationParams {
    fn default() -> Self {
        Self {
            context_window: DEFAULT_CONTEXT_WINDOW,
            empty_round_limit: Some(2),
            concurrent_turns: false,
            call_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            synthesis: SynthesisParams::default(),
        }
    }
}

impl DeliberationParams {
    // ==================== Builder Methods ====================

    pub fn with_context_window(mut self, size: usize) -> Self {
        self.context_window = size;
        self
    }

    pub fn with_empty_round_limit(mut self, limit: Option<u32>) -> Self {
        self.empty_round_limit = limit;
        self
    }

    pub fn with_concurrent_turns(mut self, enabled: bool) -> Self {
        self.concurrent_turns = enabled;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_synthesis(mut self, synthesis: SynthesisParams) -> Self {
        self.synthesis = synthesis;
        self
    }
}
