//! JSON file record store.
//!
//! The whole record document lives in one JSON file. Writers serialize on an
//! exclusive `fs2` lock on a sibling `.lock` file, then replace the document
//! with a temp file + fsync + rename, so a concurrent reader (or a crash)
//! only ever sees the previous or the next complete document.

use super::records::StoreRecords;
use async_trait::async_trait;
use fs2::FileExt;
use roundtable_application::{SessionStore, SessionUpdate, StoreError};
use roundtable_domain::{Agent, AgentId, ProviderId, ProviderProfile, Session, SessionId};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. A missing or empty file is an empty store.
    pub async fn load(&self) -> Result<StoreRecords, StoreError> {
        let path = self.path.clone();
        blocking(move || read_records(&path)).await
    }

    /// Replace the whole document.
    pub async fn save(&self, records: StoreRecords) -> Result<(), StoreError> {
        let path = self.path.clone();
        blocking(move || {
            let _lock = FileLock::acquire(&path)?;
            write_records(&path, &records)
        })
        .await
    }
}

#[async_trait]
impl SessionStore for JsonFileSessionStore {
    async fn get_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.load().await?.session(id)
    }

    async fn get_agents(&self, ids: &[AgentId]) -> Result<Vec<Agent>, StoreError> {
        Ok(self.load().await?.agents(ids))
    }

    async fn get_provider(&self, id: &ProviderId) -> Result<ProviderProfile, StoreError> {
        self.load().await?.provider(id)
    }

    async fn update_session(
        &self,
        id: &SessionId,
        update: SessionUpdate,
    ) -> Result<Session, StoreError> {
        let path = self.path.clone();
        let id = id.clone();
        blocking(move || {
            let _lock = FileLock::acquire(&path)?;
            let mut records = read_records(&path)?;
            let session = records.apply(&id, update)?;
            write_records(&path, &records)?;
            debug!("Updated session {} in {}", id, path.display());
            Ok(session)
        })
        .await
    }
}

async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Io(format!("Store task failed: {e}")))?
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> StoreError {
    StoreError::Io(format!("Failed to {} {}: {}", action, path.display(), err))
}

fn read_records(path: &Path) -> Result<StoreRecords, StoreError> {
    if !path.exists() {
        return Ok(StoreRecords::default());
    }

    let content = fs::read_to_string(path).map_err(|e| io_error("read", path, e))?;
    if content.trim().is_empty() {
        return Ok(StoreRecords::default());
    }

    serde_json::from_str(&content)
        .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))
}

fn write_records(path: &Path, records: &StoreRecords) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    let tmp_path = temp_path(path);
    let mut tmp_file = File::create(&tmp_path).map_err(|e| io_error("create", &tmp_path, e))?;
    tmp_file
        .write_all(json.as_bytes())
        .and_then(|_| tmp_file.sync_all())
        .map_err(|e| io_error("write", &tmp_path, e))?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| io_error("replace", path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "roundtable".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

/// Exclusive lock held for the duration of one read-modify-write.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| io_error("create", parent, e))?;
        }

        // Never removed: another writer may already hold a handle to it
        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| io_error("open", &lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| io_error("lock", &lock_path, e))?;

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roundtable_domain::{AgentSnapshot, SessionStatus, Turn};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn seeded(dir: &TempDir) -> (JsonFileSessionStore, SessionId) {
        let session = Session::new(
            "s1",
            "Topic",
            vec![AgentSnapshot::new("a", "A"), AgentSnapshot::new("b", "B")],
            3,
        );
        let id = session.id.clone();
        let records = StoreRecords::default().with_session(session);
        let store = JsonFileSessionStore::new(dir.path().join("data").join("records.json"));
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(store.path(), serde_json::to_string(&records).unwrap()).unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_missing_file_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileSessionStore::new(dir.path().join("absent.json"));

        let err = store.get_session(&SessionId::new("s1")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(store.get_agents(&[AgentId::new("a")]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updates_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let (store, id) = seeded(&dir);

        store
            .update_session(&id, SessionUpdate::new().status(SessionStatus::Running))
            .await
            .unwrap();
        store
            .update_session(
                &id,
                SessionUpdate::new()
                    .require(SessionStatus::Running)
                    .append_turn(Turn::new("a", "A", "first", 1))
                    .current_round(0),
            )
            .await
            .unwrap();

        let reopened = JsonFileSessionStore::new(store.path().to_path_buf());
        let session = reopened.get_session(&id).await.unwrap();
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.transcript[0].content, "first");
        assert!(!dir.path().join("data").join(".records.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_guard_failure_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let (store, id) = seeded(&dir);
        let before = std::fs::read_to_string(store.path()).unwrap();

        let err = store
            .update_session(
                &id,
                SessionUpdate::new()
                    .require(SessionStatus::Running)
                    .status(SessionStatus::Completed),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::StatusConflict { .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileSessionStore::new(path)
            .get_session(&SessionId::new("s1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let (store, id) = seeded(&dir);
        store
            .update_session(&id, SessionUpdate::new().status(SessionStatus::Running))
            .await
            .unwrap();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_session(
                        &id,
                        SessionUpdate::new().append_turn(Turn::new("a", "A", format!("t{i}"), 1)),
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_session(&id).await.unwrap().transcript.len(), 8);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips_document() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileSessionStore::new(dir.path().join("records.json"));
        let records = StoreRecords::default().with_agent(Agent::new("a", "A", "prompt"));

        store.save(records.clone()).await.unwrap();

        assert_eq!(store.load().await.unwrap(), records);
    }
}
