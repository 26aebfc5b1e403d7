//! Progress notification port
//!
//! Defines the interface for reporting progress during a deliberation run.

use roundtable_domain::{Participant, SessionId};

/// Callback for progress updates during a deliberation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait DeliberationProgress: Send + Sync {
    /// Called once the session is running, before the first scheduled round
    fn on_session_start(&self, session_id: &SessionId, participants: &[Participant], max_rounds: u32);

    /// Called when a round starts; `pending` is the number of agents to visit
    fn on_round_start(&self, round: u32, max_rounds: u32, pending: usize);

    /// Called after each agent's turn, whether it was recorded or skipped
    fn on_turn_complete(&self, round: u32, agent: &Participant, success: bool);

    /// Called when every agent of a round has been visited
    fn on_round_complete(&self, round: u32, turns_recorded: usize);

    fn on_synthesis_start(&self) {}

    fn on_synthesis_complete(&self, _action_items: &[String]) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DeliberationProgress for NoProgress {
    fn on_session_start(&self, _session_id: &SessionId, _participants: &[Participant], _max_rounds: u32) {}
    fn on_round_start(&self, _round: u32, _max_rounds: u32, _pending: usize) {}
    fn on_turn_complete(&self, _round: u32, _agent: &Participant, _success: bool) {}
    fn on_round_complete(&self, _round: u32, _turns_recorded: usize) {}
}
