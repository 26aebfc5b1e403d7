//! Shared utilities for use cases.
//!
//! Contains the bounded, retrying provider call used by both the agent turn
//! executor and the synthesis step.

use crate::config::RetryPolicy;
use crate::ports::provider_client::{CompletionRequest, ProviderClient, ProviderError};
use roundtable_domain::ProviderProfile;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A provider call that failed after all permitted attempts.
#[derive(Debug, Clone)]
pub(crate) struct CallFailure {
    pub error: ProviderError,
    pub attempts: u32,
}

/// Provider client wrapped with a per-attempt timeout and a retry policy.
pub(crate) struct ProviderInvoker<P: ?Sized> {
    provider: Arc<P>,
    retry: RetryPolicy,
    call_timeout: Duration,
    cancellation: Option<CancellationToken>,
}

impl<P: ProviderClient + ?Sized> ProviderInvoker<P> {
    pub(crate) fn new(provider: Arc<P>, retry: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            provider,
            retry,
            call_timeout,
            cancellation: None,
        }
    }

    pub(crate) fn with_cancellation(mut self, token: Option<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// Call the provider, retrying transient failures with backoff.
    ///
    /// Each attempt is bounded by the call timeout. A fired cancellation
    /// token ends the backoff wait early and returns the last error; an
    /// attempt already in flight is never interrupted by it.
    pub(crate) async fn invoke(
        &self,
        profile: &ProviderProfile,
        request: &CompletionRequest,
    ) -> Result<String, CallFailure> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let result =
                match tokio::time::timeout(self.call_timeout, self.provider.complete(profile, request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(self.call_timeout)),
                };

            let error = match result {
                Ok(text) => {
                    debug!("{} call succeeded after {} attempt(s)", profile.kind, attempts);
                    return Ok(text);
                }
                Err(error) => error,
            };

            if !error.is_retryable() || attempts > self.retry.max_retries {
                return Err(CallFailure { error, attempts });
            }

            let delay = self.retry.backoff(attempts, error.retry_after());
            warn!(
                "{} call failed ({}), retrying in {:?} [{}/{}]",
                profile.kind,
                error,
                delay,
                attempts,
                self.retry.max_retries
            );

            match &self.cancellation {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(CallFailure { error, attempts }),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}
