//! Agent domain.
//!
//! - [`entities::Agent`]: a configured LLM persona as stored by the admin layer
//! - [`entities::Participant`]: the frozen view of an agent taking part in a run

pub mod entities;
