//! Runner loop: ticks on a fixed interval and runs whichever registered
//! jobs are due, handling retries the handlers ask for.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::host::{JobContext, JobHandler, WorkerOutcome};
use crate::registry::FileJobRegistry;

const DEFAULT_TICK_SECS: u64 = 30;

/// Bounded retries with exponential backoff capped at the job interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::seconds(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32, interval: Duration) -> Duration {
        let factor = 2i32.checked_pow(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay = self
            .base_backoff
            .checked_mul(factor)
            .unwrap_or(interval);
        delay.min(interval)
    }
}

/// One handler invocation during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRun {
    pub job_name: String,
    pub attempt: u32,
    pub outcome: WorkerOutcome,
}

pub struct JobRunner {
    registry: Arc<FileJobRegistry>,
    handlers: HashMap<String, Arc<dyn JobHandler>>,
    tick_interval: std::time::Duration,
    retry: RetryPolicy,
}

impl JobRunner {
    pub fn new(registry: Arc<FileJobRegistry>) -> Self {
        Self {
            registry,
            handlers: HashMap::new(),
            tick_interval: std::time::Duration::from_secs(DEFAULT_TICK_SECS),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_handler(mut self, name: impl Into<String>, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    pub fn with_tick_interval(mut self, every: std::time::Duration) -> Self {
        self.tick_interval = every.max(std::time::Duration::from_secs(1));
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run every job due at `now`, one after another.
    pub async fn tick_once(&self, now: DateTime<Utc>) -> Result<Vec<JobRun>, StoreError> {
        let mut runs = Vec::new();

        for record in self.registry.jobs().await? {
            if !record.is_due(now) {
                continue;
            }
            let name = record.job.name.clone();
            let Some(handler) = self.handlers.get(&name) else {
                debug!(job = %name, "no handler registered; skipping");
                continue;
            };

            let attempt = if record.retry_at.is_some() { record.retry_attempt } else { 0 };
            let outcome = handler.run(&JobContext::new(name.clone(), attempt)).await;

            let interval = record.interval();
            let policy = self.retry;
            let next_attempt = attempt + 1;
            let exhausted = outcome == WorkerOutcome::Retry && next_attempt > policy.max_retries;

            let present = self
                .registry
                .update_run_state(&name, |r| {
                    if attempt == 0 {
                        r.last_run = Some(now);
                    }
                    if outcome == WorkerOutcome::Retry && !exhausted {
                        r.retry_attempt = next_attempt;
                        r.retry_at = Some(now + policy.backoff(next_attempt, interval));
                    } else {
                        r.retry_attempt = 0;
                        r.retry_at = None;
                    }
                })
                .await?;

            if !present {
                debug!(job = %name, "job cancelled while running; run state dropped");
            } else if exhausted {
                warn!(job = %name, attempts = next_attempt, "retries exhausted; waiting for next interval");
            } else if outcome == WorkerOutcome::Retry {
                info!(job = %name, attempt = next_attempt, "retry scheduled");
            }

            runs.push(JobRun {
                job_name: name,
                attempt,
                outcome,
            });
        }

        Ok(runs)
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            tick_secs = self.tick_interval.as_secs(),
            registry = %self.registry.path().display(),
            "job runner started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick_once(Utc::now()).await {
                        Ok(runs) if !runs.is_empty() => debug!(count = runs.len(), "jobs ran"),
                        Ok(_) => {}
                        Err(e) => error!("cannot read or update job registry: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("job runner stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{JobScheduler, RecurringJob, NOTIFICATION_JOB_NAME};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays scripted outcomes and records the attempts it saw.
    #[derive(Default)]
    struct Scripted {
        outcomes: Mutex<Vec<WorkerOutcome>>,
        seen: Mutex<Vec<u32>>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<WorkerOutcome>) -> Arc<Self> {
            outcomes.reverse();
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                seen: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl JobHandler for Scripted {
        async fn run(&self, ctx: &JobContext) -> WorkerOutcome {
            self.seen.lock().unwrap().push(ctx.attempt);
            self.outcomes.lock().unwrap().pop().unwrap_or(WorkerOutcome::Success)
        }
    }

    async fn setup(dir: &TempDir, handler: Arc<Scripted>) -> (Arc<FileJobRegistry>, JobRunner) {
        let reg = Arc::new(FileJobRegistry::new(dir.path().join("jobs.json")));
        reg.upsert(RecurringJob::notification(60)).await.unwrap();
        let runner = JobRunner::new(reg.clone())
            .with_handler(NOTIFICATION_JOB_NAME, handler)
            .with_retry_policy(RetryPolicy {
                max_retries: 2,
                base_backoff: Duration::seconds(60),
            });
        (reg, runner)
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_retries: 10,
            base_backoff: Duration::seconds(60),
        };
        let hour = Duration::minutes(60);
        assert_eq!(p.backoff(1, hour), Duration::seconds(60));
        assert_eq!(p.backoff(2, hour), Duration::seconds(120));
        assert_eq!(p.backoff(3, hour), Duration::seconds(240));
        assert_eq!(p.backoff(7, hour), hour);
        assert_eq!(p.backoff(40, hour), hour);
    }

    #[tokio::test]
    async fn runs_once_per_interval() {
        let dir = TempDir::new().unwrap();
        let handler = Scripted::new(vec![]);
        let (reg, runner) = setup(&dir, handler.clone()).await;
        let t0 = Utc::now();

        assert_eq!(runner.tick_once(t0).await.unwrap().len(), 1);
        assert!(runner.tick_once(t0 + Duration::minutes(30)).await.unwrap().is_empty());
        assert_eq!(runner.tick_once(t0 + Duration::minutes(60)).await.unwrap().len(), 1);

        let rec = reg.record(NOTIFICATION_JOB_NAME).await.unwrap().unwrap();
        assert_eq!(rec.last_run, Some(t0 + Duration::minutes(60)));
        assert_eq!(*handler.seen.lock().unwrap(), vec![0, 0]);
    }

    #[tokio::test]
    async fn retry_is_scheduled_with_backoff_then_cleared() {
        let dir = TempDir::new().unwrap();
        let handler = Scripted::new(vec![WorkerOutcome::Retry, WorkerOutcome::Success]);
        let (reg, runner) = setup(&dir, handler.clone()).await;
        let t0 = Utc::now();

        runner.tick_once(t0).await.unwrap();
        let rec = reg.record(NOTIFICATION_JOB_NAME).await.unwrap().unwrap();
        assert_eq!(rec.retry_attempt, 1);
        assert_eq!(rec.retry_at, Some(t0 + Duration::seconds(60)));

        assert!(runner.tick_once(t0 + Duration::seconds(30)).await.unwrap().is_empty());
        let runs = runner.tick_once(t0 + Duration::seconds(60)).await.unwrap();
        assert_eq!(runs[0].attempt, 1);
        assert_eq!(runs[0].outcome, WorkerOutcome::Success);

        let rec = reg.record(NOTIFICATION_JOB_NAME).await.unwrap().unwrap();
        assert_eq!(rec.retry_attempt, 0);
        assert_eq!(rec.retry_at, None);
        assert_eq!(rec.last_run, Some(t0));
    }

    #[tokio::test]
    async fn exhausted_retries_wait_for_next_interval() {
        let dir = TempDir::new().unwrap();
        let handler = Scripted::new(vec![WorkerOutcome::Retry; 3]);
        let (reg, runner) = setup(&dir, handler.clone()).await;
        let t0 = Utc::now();

        runner.tick_once(t0).await.unwrap();
        runner.tick_once(t0 + Duration::seconds(60)).await.unwrap();
        runner.tick_once(t0 + Duration::seconds(180)).await.unwrap();
        assert_eq!(*handler.seen.lock().unwrap(), vec![0, 1, 2]);

        let rec = reg.record(NOTIFICATION_JOB_NAME).await.unwrap().unwrap();
        assert_eq!(rec.retry_at, None);
        assert!(runner.tick_once(t0 + Duration::minutes(10)).await.unwrap().is_empty());
        assert_eq!(runner.tick_once(t0 + Duration::minutes(60)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn jobs_without_handler_are_skipped() {
        let dir = TempDir::new().unwrap();
        let reg = Arc::new(FileJobRegistry::new(dir.path().join("jobs.json")));
        reg.upsert(RecurringJob::notification(60)).await.unwrap();
        let runner = JobRunner::new(reg.clone());
        assert!(runner.tick_once(Utc::now()).await.unwrap().is_empty());
        assert_eq!(reg.record(NOTIFICATION_JOB_NAME).await.unwrap().unwrap().last_run, None);
    }

    #[tokio::test]
    async fn run_loop_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let handler = Scripted::new(vec![]);
        let (_reg, runner) = setup(&dir, handler.clone()).await;
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(runner.with_tick_interval(std::time::Duration::from_secs(1)).run(rx));
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*handler.seen.lock().unwrap(), vec![0]);
    }
}
