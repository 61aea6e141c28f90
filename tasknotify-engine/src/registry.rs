//! File-backed job table: the host side of [`JobScheduler`].
//!
//! Job definitions and their run state live together in `jobs.json` so a
//! restarted daemon picks up where the last one stopped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ScheduleError, StoreError};
use crate::host::{JobScheduler, RecurringJob};
use crate::store::{read_json, write_json_atomic};

/// A registered job plus what the runner remembers about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(flatten)]
    pub job: RecurringJob,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    /// Retries already scheduled since the last regular run.
    #[serde(default)]
    pub retry_attempt: u32,
    #[serde(default)]
    pub retry_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn new(job: RecurringJob, now: DateTime<Utc>) -> Self {
        Self {
            job,
            registered_at: now,
            last_run: None,
            retry_attempt: 0,
            retry_at: None,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.job.interval_minutes))
    }

    /// A pending retry takes precedence over the regular interval.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if let Some(at) = self.retry_at {
            return now >= at;
        }
        match self.last_run {
            None => true,
            Some(last) => now - last >= self.interval(),
        }
    }

    /// When the next regular run falls due.
    pub fn next_run(&self) -> DateTime<Utc> {
        if let Some(at) = self.retry_at {
            return at;
        }
        match self.last_run {
            None => self.registered_at,
            Some(last) => last + self.interval(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default = "registry_version")]
    version: u8,
    #[serde(default)]
    jobs: BTreeMap<String, JobRecord>,
}

fn registry_version() -> u8 {
    1
}

impl Default for RegistryFile {
    fn default() -> Self {
        Self {
            version: registry_version(),
            jobs: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct FileJobRegistry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileJobRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<RegistryFile, StoreError> {
        Ok(read_json(&self.path).await?.unwrap_or_default())
    }

    /// Every registered job, ordered by name.
    pub async fn jobs(&self) -> Result<Vec<JobRecord>, StoreError> {
        Ok(self.read_file().await?.jobs.into_values().collect())
    }

    pub async fn record(&self, name: &str) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.read_file().await?.jobs.remove(name))
    }

    /// Mutate a job's run state in place. Returns `false` if the job is gone.
    pub async fn update_run_state<F>(&self, name: &str, f: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut JobRecord) + Send,
    {
        let _guard = self.lock.lock().await;
        let mut file = self.read_file().await?;
        let Some(record) = file.jobs.get_mut(name) else {
            return Ok(false);
        };
        f(record);
        write_json_atomic(&self.path, &file).await?;
        Ok(true)
    }
}

#[async_trait]
impl JobScheduler for FileJobRegistry {
    async fn upsert(&self, job: RecurringJob) -> Result<(), ScheduleError> {
        if job.interval_minutes == 0 {
            return Err(ScheduleError::Rejected {
                name: job.name,
                reason: "interval must be positive".to_string(),
            });
        }

        let _guard = self.lock.lock().await;
        let mut file = self.read_file().await?;
        match file.jobs.get_mut(&job.name) {
            Some(existing) => {
                debug!(job = %job.name, interval_minutes = job.interval_minutes, "job definition updated");
                existing.job = job;
            }
            None => {
                debug!(job = %job.name, interval_minutes = job.interval_minutes, "job registered");
                file.jobs.insert(job.name.clone(), JobRecord::new(job, Utc::now()));
            }
        }
        write_json_atomic(&self.path, &file).await?;
        Ok(())
    }

    async fn cancel(&self, name: &str) -> Result<(), ScheduleError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read_file().await?;
        if file.jobs.remove(name).is_some() {
            write_json_atomic(&self.path, &file).await?;
            debug!(job = name, "job removed");
        }
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<RecurringJob>, ScheduleError> {
        Ok(self.record(name).await?.map(|r| r.job))
    }
}
