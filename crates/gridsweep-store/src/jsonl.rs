//! Durable JSON-lines execution store
//!
//! One record per line, append-only. The table stamp is the number of stored
//! lines. Every call holds an advisory lock on a sidecar `<file>.lock`
//! (`flock(2)` on Unix via `fs2`): inserts take it exclusively across
//! load, check and append, reads take it shared. Handles in other processes
//! therefore see each other's appends and stale writes are rejected. The file
//! is re-read on every call; nothing is cached between calls.

use crate::error::StoreError;
use crate::record::{ConcurrencyStamp, PendingExecution, StoredExecution};
use crate::store::ExecutionStore;
use fs2::FileExt;
use gridsweep_core::ExecutionId;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Advisory lock on the sidecar file, released when dropped
#[derive(Debug)]
struct FileLock {
    _file: std::fs::File,
}

impl FileLock {
    /// Block (on the blocking pool) until the lock is granted
    async fn acquire(path: PathBuf, mode: LockMode) -> Result<Self, StoreError> {
        let locked = tokio::task::spawn_blocking(move || -> std::io::Result<Self> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)?;
            match mode {
                LockMode::Shared => FileExt::lock_shared(&file)?,
                LockMode::Exclusive => FileExt::lock_exclusive(&file)?,
            }
            Ok(Self { _file: file })
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("store lock task failed: {e}")))?;

        locked.map_err(StoreError::from)
    }
}

/// File-backed implementation of `ExecutionStore`
#[derive(Debug)]
pub struct JsonLinesExecutionStore {
    path: PathBuf,
    lock_path: PathBuf,
    /// Queues this handle's own callers before they reach the file lock
    local: Mutex<()>,
}

impl JsonLinesExecutionStore {
    /// Open (lazily) a store backed by `path`
    ///
    /// The file, its lock file and the parent directory are created on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.as_os_str().to_owned();
        lock_name.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_name),
            local: Mutex::new(()),
        }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn lock(&self, mode: LockMode) -> Result<FileLock, StoreError> {
        FileLock::acquire(self.lock_path.clone(), mode).await
    }

    async fn load(&self) -> Result<Vec<StoredExecution>, StoreError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }

    async fn append(&self, stored: &StoredExecution) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(stored)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.sync_data().await?;
        Ok(())
    }
}

fn stamp_of(rows: &[StoredExecution]) -> ConcurrencyStamp {
    ConcurrencyStamp(rows.len() as u64)
}

#[async_trait::async_trait]
impl ExecutionStore for JsonLinesExecutionStore {
    async fn insert(&self, pending: &PendingExecution) -> Result<StoredExecution, StoreError> {
        let _local = self.local.lock().await;
        let _lock = self.lock(LockMode::Exclusive).await?;

        let rows = self.load().await?;
        let current = stamp_of(&rows);
        if pending.baseline() != current {
            return Err(StoreError::conflict(pending.baseline(), Some(current)));
        }

        let last_id = rows.iter().map(|r| r.id.0).max().unwrap_or(0);
        let stored = StoredExecution {
            id: ExecutionId(last_id + 1),
            stamp: current.next(),
            execution: pending.execution().clone(),
        };

        self.append(&stored).await?;
        tracing::debug!(id = %stored.id, path = %self.path.display(), "execution appended");
        Ok(stored)
    }

    async fn current_stamp(&self) -> Result<ConcurrencyStamp, StoreError> {
        let _local = self.local.lock().await;
        let _lock = self.lock(LockMode::Shared).await?;
        Ok(stamp_of(&self.load().await?))
    }

    async fn list(&self) -> Result<Vec<StoredExecution>, StoreError> {
        let _local = self.local.lock().await;
        let _lock = self.lock(LockMode::Shared).await?;
        self.load().await
    }
}
