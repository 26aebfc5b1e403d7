//! In-memory record store.

use super::records::StoreRecords;
use async_trait::async_trait;
use roundtable_application::{SessionStore, SessionUpdate, StoreError};
use roundtable_domain::{Agent, AgentId, ProviderId, ProviderProfile, Session, SessionId};
use tokio::sync::RwLock;

/// Record store held in process memory.
///
/// Updates take the write lock for their whole duration, so readers never
/// observe half of one.
#[derive(Default)]
pub struct InMemorySessionStore {
    records: RwLock<StoreRecords>,
}

impl InMemorySessionStore {
    pub fn new(records: StoreRecords) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.records.read().await.session(id)
    }

    async fn get_agents(&self, ids: &[AgentId]) -> Result<Vec<Agent>, StoreError> {
        Ok(self.records.read().await.agents(ids))
    }

    async fn get_provider(&self, id: &ProviderId) -> Result<ProviderProfile, StoreError> {
        self.records.read().await.provider(id)
    }

    async fn update_session(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError> {
        self.records.write().await.apply(id, update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{AgentSnapshot, SessionStatus, Turn};

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(StoreRecords::default().with_session(Session::new(
            "s1",
            "Topic",
            vec![AgentSnapshot::new("a", "A"), AgentSnapshot::new("b", "B")],
            1,
        )))
    }

    #[tokio::test]
    async fn test_guarded_update_is_all_or_nothing() {
        let store = store();
        let id = SessionId::new("s1");

        let err = store
            .update_session(
                &id,
                SessionUpdate::new()
                    .require(SessionStatus::Running)
                    .append_turn(Turn::new("a", "A", "hi", 1)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.conflicting_status(), Some(SessionStatus::Draft));
        assert!(store.get_session(&id).await.unwrap().transcript.is_empty());

        store
            .update_session(&id, SessionUpdate::new().status(SessionStatus::Running))
            .await
            .unwrap();
        let updated = store
            .update_session(
                &id,
                SessionUpdate::new()
                    .require(SessionStatus::Running)
                    .append_turn(Turn::new("a", "A", "hi", 1)),
            )
            .await
            .unwrap();
        assert_eq!(updated.transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_provider_is_not_found() {
        let err = store()
            .get_provider(&ProviderId::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "provider", .. }));
    }
}
