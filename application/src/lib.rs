//! Application layer for roundtable
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{DeliberationParams, RetryPolicy, SynthesisParams};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    progress::{DeliberationProgress, NoProgress},
    provider_client::{CompletionRequest, ProviderClient, ProviderError},
    session_store::{SessionStore, SessionUpdate, StoreError},
};
pub use use_cases::agent_turn::{AgentTurnExecutor, TurnError, TurnInput};
pub use use_cases::cancel_session::{CancelOutcome, CancelSessionUseCase};
pub use use_cases::run_deliberation::{
    DeliberationErrorKind, DeliberationOutcome, RunDeliberationError, RunDeliberationUseCase,
};
pub use use_cases::session_query::GetSessionUseCase;
pub use use_cases::synthesis::{SynthesisOutcome, SynthesisStep};
