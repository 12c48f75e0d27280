//! Keyed record store for summarized documents.
//!
//! Records keep insertion order. Readers share a lock and never observe a partially applied
//! mutation; writers are serialized, so two deletes of the same id resolve to one success and
//! one [`StoreError::NotFound`]. When a snapshot path is configured, every mutation is written
//! through to disk before the lock is released and rolled back if the write fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A summarized upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque identifier assigned at ingestion.
    pub id: String,
    /// Original upload name; not unique.
    pub filename: String,
    /// Backend summary or the unavailable placeholder.
    pub summary: String,
    /// Creation timestamp (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Document {
    /// Create a record with a fresh identifier stamped with the current time.
    pub fn new(filename: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            filename: filename.into(),
            summary: summary.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Errors returned by document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with this identifier already exists.
    #[error("Document id already exists: {0}")]
    DuplicateIdentifier(String),
    /// No record has this identifier.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// Snapshot could not be read or written.
    #[error("Document snapshot failed: {0}")]
    Persistence(String),
}

/// Storage operations required by the ingestion and query pipelines.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store a new record; fails when the id is taken.
    async fn insert(&self, document: Document) -> Result<(), StoreError>;

    /// Return every record in storage order.
    async fn list_all(&self) -> Result<Vec<Document>, StoreError>;

    /// Return the records whose id is in `ids`, in storage order. Unknown ids are skipped.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<Document>, StoreError>;

    /// Remove a record and return it; fails when the id is unknown.
    async fn delete_by_id(&self, id: &str) -> Result<Document, StoreError>;
}

#[derive(Default)]
struct Records {
    ordered: Vec<Document>,
    ids: HashSet<String>,
}

impl Records {
    fn from_documents(documents: Vec<Document>) -> Result<Self, StoreError> {
        let mut records = Self::default();
        for document in documents {
            if records.ids.contains(&document.id) {
                return Err(StoreError::DuplicateIdentifier(document.id));
            }
            records.push(document);
        }
        Ok(records)
    }

    fn push(&mut self, document: Document) {
        self.ids.insert(document.id.clone());
        self.ordered.push(document);
    }

    fn pop(&mut self) {
        if let Some(document) = self.ordered.pop() {
            self.ids.remove(&document.id);
        }
    }

    fn remove(&mut self, position: usize) -> Document {
        let document = self.ordered.remove(position);
        self.ids.remove(&document.id);
        document
    }

    fn restore(&mut self, position: usize, document: Document) {
        self.ids.insert(document.id.clone());
        self.ordered.insert(position, document);
    }
}

/// In-process store with optional JSON snapshot persistence.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    records: RwLock<Records>,
    snapshot_path: Option<PathBuf>,
}

impl InMemoryDocumentStore {
    /// Create an empty, memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store backed by the snapshot at `path`; a missing file yields an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let documents = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<Document>>(&bytes).map_err(|error| {
                StoreError::Persistence(format!("invalid snapshot {}: {error}", path.display()))
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(error) => {
                return Err(StoreError::Persistence(format!(
                    "failed to read {}: {error}",
                    path.display()
                )));
            }
        };
        tracing::info!(path = %path.display(), documents = documents.len(), "Opened document snapshot");

        Ok(Self {
            records: RwLock::new(Records::from_documents(documents)?),
            snapshot_path: Some(path),
        })
    }

    async fn persist(&self, records: &Records) -> Result<(), StoreError> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };
        write_snapshot(path, &records.ordered)
            .await
            .map_err(|error| {
                tracing::error!(path = %path.display(), error = %error, "Snapshot write failed");
                StoreError::Persistence(format!("failed to write {}: {error}", path.display()))
            })
    }
}

async fn write_snapshot(path: &Path, documents: &[Document]) -> std::io::Result<()> {
    let bytes = serde_json::to_vec_pretty(documents)?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: Document) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.ids.contains(&document.id) {
            return Err(StoreError::DuplicateIdentifier(document.id));
        }
        records.push(document);
        if let Err(error) = self.persist(&records).await {
            records.pop();
            return Err(error);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.records.read().await.ordered.clone())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let records = self.records.read().await;
        Ok(records
            .ordered
            .iter()
            .filter(|document| wanted.contains(document.id.as_str()))
            .cloned()
            .collect())
    }

    async fn delete_by_id(&self, id: &str) -> Result<Document, StoreError> {
        let mut records = self.records.write().await;
        let position = records
            .ordered
            .iter()
            .position(|document| document.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let removed = records.remove(position);
        if let Err(error) = self.persist(&records).await {
            records.restore(position, removed);
            return Err(error);
        }
        Ok(removed)
    }
}
