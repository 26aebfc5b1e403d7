//! Session Query use case
//!
//! Read-only view of a session for presentation: the transcript as it
//! stands, whether it is partial, and any action items.

use crate::ports::session_store::{SessionStore, StoreError};
use roundtable_domain::{SessionId, SessionProjection};
use std::sync::Arc;

pub struct GetSessionUseCase<S: ?Sized> {
    store: Arc<S>,
}

impl<S: SessionStore + ?Sized> GetSessionUseCase<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, session_id: &SessionId) -> Result<SessionProjection, StoreError> {
        let session = self.store.get_session(session_id).await?;
        Ok(SessionProjection::from(&session))
    }
}
