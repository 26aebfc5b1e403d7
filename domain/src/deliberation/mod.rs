//! Deliberation scheduling.
//!
//! - [`schedule::RoundSchedule`]: `(round, agent)` visiting order for a session
//! - [`schedule::ContextWindow`]: how much prior discussion each turn sees

pub mod schedule;
