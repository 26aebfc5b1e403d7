//! Cancel Session use case
//!
//! The external cancellation path. It only ever writes the status field,
//! and only while the session is running; the orchestrator notices the
//! change before its next turn.

use crate::ports::session_store::{SessionStore, SessionUpdate, StoreError};
use roundtable_domain::{SessionEvent, SessionId, SessionStatus};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// Nothing to cancel; the session was already in the given status
    NotRunning(SessionStatus),
}

pub struct CancelSessionUseCase<S: ?Sized> {
    store: Arc<S>,
}

impl<S: SessionStore + ?Sized> CancelSessionUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Request cancellation. Repeated requests are harmless.
    pub async fn execute(&self, session_id: &SessionId) -> Result<CancelOutcome, StoreError> {
        let session = self.store.get_session(session_id).await?;
        let Ok(next) = session.status.transition(SessionEvent::Cancel) else {
            info!(
                "Session {} is {}; nothing to cancel",
                session_id, session.status
            );
            return Ok(CancelOutcome::NotRunning(session.status));
        };

        let update = SessionUpdate::new()
            .require(SessionStatus::Running)
            .status(next);
        match self.store.update_session(session_id, update).await {
            Ok(_) => {
                info!("Session {} cancelled", session_id);
                Ok(CancelOutcome::Cancelled)
            }
            Err(StoreError::StatusConflict { actual, .. }) => Ok(CancelOutcome::NotRunning(actual)),
            Err(e) => Err(e),
        }
    }
}
