//! Audit storage backends.

use crate::error::AuditError;
use crate::query::AuditQuery;
use crate::record::AuditRecord;
use async_trait::async_trait;
use conduit_core::{StorageBackend, StorageConfig};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Trait for audit storage backends.
///
/// Records are append-only: nothing in the crate updates or deletes one.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append a record.
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError>;

    /// Query records with filters.
    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError>;

    /// Count records matching a query.
    async fn count(&self, query: &AuditQuery) -> Result<usize, AuditError> {
        Ok(self.query(query).await?.len())
    }

    /// Get a record by ID.
    async fn get(&self, record_id: Uuid) -> Result<Option<AuditRecord>, AuditError>;
}

/// Create the audit store named by configuration.
///
/// The Postgres backend lives in `conduit-store-pg` and is constructed by the
/// caller; asking for it here is an error.
pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn AuditStore>, AuditError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryAuditStore::new())),
        StorageBackend::File => Ok(Arc::new(FileAuditStore::open(&config.audit_path).await?)),
        StorageBackend::Postgres => Err(AuditError::InitializationFailed(
            "postgres audit storage must be built from a database pool".to_string(),
        )),
    }
}

/// In-memory storage.
#[derive(Default)]
pub struct MemoryAuditStore {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        let mut records = self.records.write().map_err(|e| {
            AuditError::Unavailable(format!("Failed to acquire write lock: {}", e))
        })?;
        records.push(record);
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(|e| {
            AuditError::Unavailable(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(query.apply(records.iter()))
    }

    async fn get(&self, record_id: Uuid) -> Result<Option<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(|e| {
            AuditError::Unavailable(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(records.iter().find(|r| r.id == record_id).cloned())
    }
}

/// JSON-lines file storage.
///
/// Existing lines are loaded on open so queries see records from earlier
/// runs. Writes go to the file first, then to the in-memory index.
pub struct FileAuditStore {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
    records: RwLock<Vec<AuditRecord>>,
}

impl FileAuditStore {
    /// Open (or create) the audit file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_lines(&path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(AuditError::InitializationFailed(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| AuditError::InitializationFailed(format!("{}: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), records = records.len(), "Opened audit log");

        Ok(Self {
            path,
            file: Mutex::new(file),
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_lines(path: &Path, contents: &str) -> Vec<AuditRecord> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str::<AuditRecord>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = n + 1,
                    error = %e,
                    "Skipping unreadable audit line"
                );
                None
            }
        })
        .collect()
}

#[async_trait]
impl AuditStore for FileAuditStore {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        let mut json = serde_json::to_string(&record)?;
        json.push('\n');

        {
            let mut file = self.file.lock().await;
            file.write_all(json.as_bytes())
                .await
                .map_err(|e| AuditError::AppendFailed(e.to_string()))?;
            file.flush()
                .await
                .map_err(|e| AuditError::AppendFailed(e.to_string()))?;
        }

        let mut records = self.records.write().map_err(|e| {
            AuditError::Unavailable(format!("Failed to acquire write lock: {}", e))
        })?;
        records.push(record);
        Ok(())
    }

    async fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(|e| {
            AuditError::Unavailable(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(query.apply(records.iter()))
    }

    async fn get(&self, record_id: Uuid) -> Result<Option<AuditRecord>, AuditError> {
        let records = self.records.read().map_err(|e| {
            AuditError::Unavailable(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(records.iter().find(|r| r.id == record_id).cloned())
    }
}
