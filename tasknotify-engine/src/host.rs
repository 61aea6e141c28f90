//! Capabilities the engine needs from its host: a named recurring-job
//! scheduler and the handler contract it invokes on every tick.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Logical name of the one reminder job. At most one job with this name exists.
pub const NOTIFICATION_JOB_NAME: &str = "task_notification_job";

pub const NOTIFICATION_JOB_TAG: &str = "task_notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkRequirement {
    NotRequired,
    Connected,
}

/// Conditions the host should honour before running a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConstraints {
    pub network: NetworkRequirement,
    pub requires_charging: bool,
    pub requires_battery_not_low: bool,
}

impl Default for JobConstraints {
    fn default() -> Self {
        Self {
            network: NetworkRequirement::NotRequired,
            requires_charging: false,
            requires_battery_not_low: true,
        }
    }
}

/// A periodic job registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringJob {
    pub name: String,
    pub interval_minutes: u32,
    #[serde(default)]
    pub constraints: JobConstraints,
    #[serde(default)]
    pub tag: String,
}

impl RecurringJob {
    pub fn notification(interval_minutes: u32) -> Self {
        Self {
            name: NOTIFICATION_JOB_NAME.to_string(),
            interval_minutes,
            constraints: JobConstraints::default(),
            tag: NOTIFICATION_JOB_TAG.to_string(),
        }
    }
}

/// Host periodic-job facility, keyed by job name.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Register `job`, replacing any job with the same name in one step.
    ///
    /// Replacement keeps the existing job's run history; only the definition
    /// (interval, constraints) changes.
    async fn upsert(&self, job: RecurringJob) -> Result<(), ScheduleError>;

    /// Remove the named job. Cancelling an unknown name is not an error.
    async fn cancel(&self, name: &str) -> Result<(), ScheduleError>;

    async fn get(&self, name: &str) -> Result<Option<RecurringJob>, ScheduleError>;
}

/// What a job body reports back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    Success,
    /// Transient failure; the host decides when to try again.
    Retry,
}

/// Opaque per-invocation context handed to a job body.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_name: String,
    /// 0 for a regular tick, n for the n-th retry.
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
}

impl JobContext {
    pub fn new(job_name: impl Into<String>, attempt: u32) -> Self {
        Self {
            job_name: job_name.into(),
            attempt,
            started_at: Utc::now(),
        }
    }
}

/// A job body the host runs on each tick.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, ctx: &JobContext) -> WorkerOutcome;
}

/// Job table held in memory. Useful for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryJobScheduler {
    jobs: Mutex<HashMap<String, RecurringJob>>,
}

impl MemoryJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<RecurringJob> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<RecurringJob> = jobs.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

#[async_trait]
impl JobScheduler for MemoryJobScheduler {
    async fn upsert(&self, job: RecurringJob) -> Result<(), ScheduleError> {
        if job.interval_minutes == 0 {
            return Err(ScheduleError::Rejected {
                name: job.name,
                reason: "interval must be positive".to_string(),
            });
        }
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.insert(job.name.clone(), job);
        Ok(())
    }

    async fn cancel(&self, name: &str) -> Result<(), ScheduleError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        jobs.remove(name);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<RecurringJob>, ScheduleError> {
        let jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        Ok(jobs.get(name).cloned())
    }
}
