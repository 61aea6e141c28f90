//! Settings and task stores.
//!
//! Both are consumed through async traits so the engine never cares where the
//! records live. The JSON implementations keep one file each and replace it
//! atomically (unique temp file, then rename) on every save.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tasknotify_core::{sort_for_listing, NotificationSettings, Task};
use tokio::sync::Mutex;

use crate::error::StoreError;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// The stored record, or `None` before the first save.
    async fn load(&self) -> Result<Option<NotificationSettings>, StoreError>;

    /// Replace the stored record.
    async fn save(&self, settings: &NotificationSettings) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks, HIGH priority first, newest first within a priority.
    async fn all_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Tasks that are not completed, in listing order.
    async fn active_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.all_tasks().await?;
        tasks.retain(Task::is_active);
        Ok(tasks)
    }

    async fn get(&self, id: u64) -> Result<Option<Task>, StoreError>;

    /// Insert a task, ignoring its `id`, and return the assigned id.
    async fn insert(&self, task: Task) -> Result<u64, StoreError>;

    /// Replace an existing task. Fails with [`StoreError::TaskNotFound`] if absent.
    async fn update(&self, task: &Task) -> Result<(), StoreError>;

    /// Returns `false` when no task had that id.
    async fn delete(&self, id: u64) -> Result<bool, StoreError>;
}

pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Write `value` to a uniquely named temp file next to `path`, fsync, then
/// rename over `path`. Concurrent writers never share a temp file.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await.map_err(io_err)?;

    let json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| io_err(std::io::Error::other(e)))?
    .map_err(io_err)
}

/// Settings record kept in a single JSON file.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> Result<Option<NotificationSettings>, StoreError> {
        read_json(&self.path).await
    }

    async fn save(&self, settings: &NotificationSettings) -> Result<(), StoreError> {
        write_json_atomic(&self.path, settings).await
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskFile {
    next_id: u64,
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Tasks kept in a single JSON file.
///
/// Mutations hold an in-process lock across read-modify-write.
#[derive(Debug)]
pub struct JsonTaskStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonTaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<TaskFile, StoreError> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }
}

#[async_trait]
impl TaskStore for JsonTaskStore {
    async fn all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.read_file().await?.tasks;
        sort_for_listing(&mut tasks);
        Ok(tasks)
    }

    async fn get(&self, id: u64) -> Result<Option<Task>, StoreError> {
        Ok(self.read_file().await?.tasks.into_iter().find(|t| t.id == id))
    }

    async fn insert(&self, mut task: Task) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read_file().await?;
        let max_existing = file.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        let id = file.next_id.max(max_existing) + 1;
        task.id = id;
        file.next_id = id;
        file.tasks.push(task);
        write_json_atomic(&self.path, &file).await?;
        Ok(id)
    }

    async fn update(&self, task: &Task) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read_file().await?;
        let slot = file
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(StoreError::TaskNotFound(task.id))?;
        *slot = task.clone();
        write_json_atomic(&self.path, &file).await
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read_file().await?;
        let before = file.tasks.len();
        file.tasks.retain(|t| t.id != id);
        if file.tasks.len() == before {
            return Ok(false);
        }
        write_json_atomic(&self.path, &file).await?;
        Ok(true)
    }
}
