//! Round scheduling and context window truncation.
//!
//! Agents are visited round-robin in the order fixed at session creation,
//! repeated `max_rounds` times. The order is never reshuffled, so the
//! transcript of a given agent list is deterministic: rounds are
//! non-decreasing and, within a round, turns follow the visiting order.

use crate::core::ids::AgentId;
use crate::session::entities::{Session, Turn};
use std::ops::RangeInclusive;

/// Default number of most recent turns shown to each agent.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// One scheduled `(round, agent)` visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    /// 1-indexed round
    pub round: u32,
    /// Index into the visiting order
    pub position: usize,
}

/// Visiting order of a session.
#[derive(Debug, Clone)]
pub struct RoundSchedule {
    agents: Vec<AgentId>,
    max_rounds: u32,
}

impl RoundSchedule {
    pub fn new(agents: Vec<AgentId>, max_rounds: u32) -> Self {
        Self { agents, max_rounds }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::new(
            session.agent_snapshots.iter().map(|a| a.id.clone()).collect(),
            session.max_rounds,
        )
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Rounds still to visit after `last_completed` (empty when done).
    pub fn rounds_after(&self, last_completed: u32) -> RangeInclusive<u32> {
        (last_completed + 1)..=self.max_rounds
    }

    /// Every visit of the session in round-major, agent-minor order.
    pub fn work_items(&self) -> Vec<WorkItem> {
        (1..=self.max_rounds)
            .flat_map(|round| {
                (0..self.agents.len()).map(move |position| WorkItem { round, position })
            })
            .collect()
    }

    /// Positions in `round` whose agent has no turn recorded yet.
    ///
    /// Used when resuming a round that was interrupted part-way.
    pub fn pending_positions(&self, round: u32, transcript: &[Turn]) -> Vec<usize> {
        self.agents
            .iter()
            .enumerate()
            .filter(|(_, id)| {
                !transcript
                    .iter()
                    .any(|t| t.round == round && &t.agent_id == *id)
            })
            .map(|(position, _)| position)
            .collect()
    }

    /// Position of `agent` in the visiting order.
    pub fn position_of(&self, agent: &AgentId) -> Option<usize> {
        self.agents.iter().position(|a| a == agent)
    }

    /// Check the transcript ordering invariant against this schedule.
    ///
    /// Rounds must be non-decreasing and within one round the agents'
    /// positions must strictly increase. Skipped agents are allowed.
    pub fn is_in_visiting_order(&self, transcript: &[Turn]) -> bool {
        let mut last: Option<(u32, usize)> = None;
        for turn in transcript {
            let Some(position) = self.position_of(&turn.agent_id) else {
                return false;
            };
            if turn.round == 0 || turn.round > self.max_rounds {
                return false;
            }
            if let Some((round, pos)) = last
                && (turn.round < round || (turn.round == round && position <= pos))
            {
                return false;
            }
            last = Some((turn.round, position));
        }
        true
    }
}

/// Context window truncation policy.
///
/// Selects the most recent `size` turns regardless of round boundaries, so
/// later agents can react to earlier rounds and not just the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    size: usize,
}

impl ContextWindow {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn select<'a>(&self, transcript: &'a [Turn]) -> &'a [Turn] {
        let start = transcript.len().saturating_sub(self.size);
        &transcript[start..]
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW)
    }
}
