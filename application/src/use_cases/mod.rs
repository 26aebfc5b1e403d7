//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent_turn;
pub mod cancel_session;
pub mod run_deliberation;
pub mod session_query;
pub(crate) mod shared;
pub mod synthesis;
pub mod transcript;
