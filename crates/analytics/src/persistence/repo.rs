#![forbid(unsafe_code)]

use crate::domain::HistoryContainer;
use crate::error::Error;
use crate::persistence::fold_keys;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Load the persisted history. `Ok(None)` means nothing was ever saved.
    async fn load(&self) -> Result<Option<HistoryContainer>, Error>;
    /// Persist the full history, replacing what was there.
    async fn save(&self, history: &HistoryContainer) -> Result<(), Error>;
    /// Remove the persisted history.
    async fn clear(&self) -> Result<(), Error>;
}

/// Keeps history in memory only. Counts saves so callers can observe
/// write-through behavior.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    history: Mutex<Option<HistoryContainer>>,
    saves: AtomicUsize,
}

impl MemoryRepository {
    pub fn with_history(history: HistoryContainer) -> Self {
        Self {
            history: Mutex::new(Some(history)),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn stored(&self) -> Option<HistoryContainer> {
        self.history.lock().clone()
    }
}

#[async_trait]
impl HistoryRepository for MemoryRepository {
    async fn load(&self) -> Result<Option<HistoryContainer>, Error> {
        Ok(self.history.lock().clone())
    }

    async fn save(&self, history: &HistoryContainer) -> Result<(), Error> {
        *self.history.lock() = Some(history.clone());
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.history.lock().take();
        Ok(())
    }
}

/// A single pretty-printed JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf, Error> {
        let name = self
            .path
            .file_name()
            .ok_or_else(|| Error::InvalidPath(self.path.clone()))?;
        let mut temp = name.to_os_string();
        temp.push(".tmp");
        Ok(self.path.with_file_name(temp))
    }
}

#[async_trait]
impl HistoryRepository for JsonFileRepository {
    async fn load(&self) -> Result<Option<HistoryContainer>, Error> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        let history = serde_json::from_value(fold_keys(value))?;
        debug!(path = %self.path.display(), "history loaded");
        Ok(Some(history))
    }

    async fn save(&self, history: &HistoryContainer) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(history)?;
        let temp = self.temp_path()?;
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!(
            path = %self.path.display(),
            snapshots = history.snapshots.len(),
            "history persisted"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
