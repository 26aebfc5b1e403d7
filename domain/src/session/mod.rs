//! Deliberation session domain.
//!
//! - [`entities::Session`]: one deliberation run over a topic
//! - [`entities::Turn`]: one agent's contribution within one round
//! - [`status::SessionStatus`]: the `draft → running → completed | cancelled` state machine
//! - [`projection::SessionProjection`]: read-only view for progress polling

pub mod entities;
pub mod projection;
pub mod status;
