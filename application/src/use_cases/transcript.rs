//! Transcript accumulator
//!
//! Keeps the in-memory view of a running session's transcript in step with
//! the store. Every write is guarded on the session still running, so a
//! cancellation written by someone else is never overwritten, and on the
//! stored transcript still matching this view, so a second run over the
//! same session cannot append a turn twice.

use crate::ports::session_store::{SessionStore, SessionUpdate, StoreError};
use roundtable_domain::{Session, SessionId, SessionStatus, Turn};
use std::sync::Arc;
use tracing::debug;

/// Result of a guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Persisted,
    /// The session left the running state; nothing was written.
    Halted(SessionStatus),
    /// Another run appended turns this one has not seen; nothing was written.
    Superseded,
}

pub struct TranscriptAccumulator<S: ?Sized> {
    store: Arc<S>,
    session_id: SessionId,
    turns: Vec<Turn>,
    current_round: u32,
}

impl<S: SessionStore + ?Sized> TranscriptAccumulator<S> {
    /// Seed from the session as loaded, including any turns recorded by an
    /// earlier run.
    pub fn new(store: Arc<S>, session: &Session) -> Self {
        Self {
            store,
            session_id: session.id.clone(),
            turns: session.transcript.clone(),
            current_round: session.current_round,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn turns_in_round(&self, round: u32) -> usize {
        self.turns.iter().filter(|t| t.round == round).count()
    }

    /// Persist one turn. The stored current round is carried unchanged.
    pub async fn append(&mut self, turn: Turn) -> Result<WriteOutcome, StoreError> {
        let update = SessionUpdate::new()
            .require(SessionStatus::Running)
            .require_turns(self.turns.len())
            .append_turn(turn.clone())
            .current_round(self.current_round);

        let outcome = self.write(update).await?;
        if outcome == WriteOutcome::Persisted {
            debug!(
                "Appended turn {} (round {}, {})",
                self.turns.len() + 1,
                turn.round,
                turn.agent_name
            );
            self.turns.push(turn);
        }
        Ok(outcome)
    }

    /// Mark `round` as fully visited.
    pub async fn finish_round(&mut self, round: u32) -> Result<WriteOutcome, StoreError> {
        let update = SessionUpdate::new()
            .require(SessionStatus::Running)
            .require_turns(self.turns.len())
            .current_round(round);

        let outcome = self.write(update).await?;
        if outcome == WriteOutcome::Persisted {
            self.current_round = round;
        }
        Ok(outcome)
    }

    /// Status as currently stored.
    pub async fn stored_status(&self) -> Result<SessionStatus, StoreError> {
        Ok(self.store.get_session(&self.session_id).await?.status)
    }

    async fn write(&self, update: SessionUpdate) -> Result<WriteOutcome, StoreError> {
        match self.store.update_session(&self.session_id, update).await {
            Ok(_) => Ok(WriteOutcome::Persisted),
            Err(StoreError::StatusConflict { actual, .. }) => Ok(WriteOutcome::Halted(actual)),
            Err(StoreError::TranscriptConflict { expected, actual }) => {
                debug!(
                    "Transcript moved from {} to {} turn(s) under us",
                    expected, actual
                );
                Ok(WriteOutcome::Superseded)
            }
            Err(e) => Err(e),
        }
    }
}
