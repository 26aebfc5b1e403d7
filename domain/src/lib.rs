//! Domain layer for roundtable
//!
//! This crate contains the entities, value objects and pure policies of the
//! deliberation core. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! - **Agent**: a configured LLM persona (prompt, sampling parameters, provider)
//! - **Session**: one deliberation run over a topic with a bounded round count
//! - **Turn**: one agent's contribution within one round
//! - **Round**: one pass over every participating agent, in a fixed order
//! - **Synthesis**: the final call that condenses the transcript into action items

pub mod agent;
pub mod core;
pub mod deliberation;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod synthesis;

// Re-export commonly used types
pub use agent::entities::{Agent, AgentSettings, Participant};
pub use core::{
    error::DomainError,
    ids::{AgentId, ProviderId, SessionId},
};
pub use deliberation::schedule::{ContextWindow, DEFAULT_CONTEXT_WINDOW, RoundSchedule, WorkItem};
pub use prompt::{PromptTemplate, TurnPromptContext};
pub use providers::{
    message::{Message, Role},
    profile::{ProviderKind, ProviderProfile},
};
pub use session::{
    entities::{AgentSnapshot, MIN_AGENTS, Session, StartMode, Turn},
    projection::SessionProjection,
    status::{SessionEvent, SessionStatus},
};
pub use synthesis::{MAX_ACTION_ITEMS, parse_action_items};
