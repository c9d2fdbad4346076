//! Snapshot persistence keyed by conversation id
//!
//! The state machine never touches storage; callers load a snapshot before a
//! turn and save the result after it.

use crate::state_machine::Snapshot;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("No snapshot for conversation {0}")]
    NotFound(String),
    #[error("Invalid conversation id: {0:?}")]
    InvalidId(String),
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, conv_id: &str) -> Result<Option<Snapshot>, StoreError>;

    async fn save(&self, conv_id: &str, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Like [`load`](Self::load), for a conversation that must already exist
    async fn load_existing(&self, conv_id: &str) -> Result<Snapshot, StoreError> {
        self.load(conv_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(conv_id.to_string()))
    }
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    async fn load(&self, conv_id: &str) -> Result<Option<Snapshot>, StoreError> {
        (**self).load(conv_id).await
    }

    async fn save(&self, conv_id: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        (**self).save(conv_id, snapshot).await
    }
}

/// One pretty-printed JSON file per conversation: `{dir}/{id}.json`
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, conv_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !conv_id.is_empty()
            && conv_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(conv_id.to_string()));
        }
        Ok(self.dir.join(format!("{conv_id}.json")))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn load(&self, conv_id: &str) -> Result<Option<Snapshot>, StoreError> {
        let path = self.path_for(conv_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(Snapshot::from_json(&json)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, conv_id: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        let path = self.path_for(conv_id)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write then rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, snapshot.to_json()?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!(conv_id, path = %path.display(), "Snapshot saved");
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<HashMap<String, Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self, conv_id: &str) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.snapshots.lock().await.get(conv_id).cloned())
    }

    async fn save(&self, conv_id: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.snapshots
            .lock()
            .await
            .insert(conv_id.to_string(), snapshot.clone());
        Ok(())
    }
}
