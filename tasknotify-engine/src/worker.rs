//! Notification worker: the body of the recurring reminder job.

use std::sync::Arc;

use async_trait::async_trait;
use tasknotify_core::{evaluate, Clock, Decision, Moment, PrioritySummary};
use tracing::{debug, info, warn};

use crate::alert::{Alert, AlertError, AlertSink};
use crate::error::StoreError;
use crate::host::{JobContext, JobHandler, WorkerOutcome};
use crate::store::{SettingsStore, TaskStore};

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    NoSettings,
    Suppressed { at: Moment, decision: Decision },
    NoActiveTasks { at: Moment },
    Alerted { at: Moment, counts: PrioritySummary },
}

#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Alert(#[from] AlertError),
}

pub struct NotificationWorker {
    settings: Arc<dyn SettingsStore>,
    tasks: Arc<dyn TaskStore>,
    alerts: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
}

impl NotificationWorker {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        tasks: Arc<dyn TaskStore>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            tasks,
            alerts,
            clock,
        }
    }

    /// Run one tick, mapping every failure to [`WorkerOutcome::Retry`].
    pub async fn run(&self, ctx: &JobContext) -> WorkerOutcome {
        match self.tick(ctx).await {
            Ok(report) => {
                debug!(job = %ctx.job_name, attempt = ctx.attempt, ?report, "tick finished");
                WorkerOutcome::Success
            }
            Err(e) => {
                warn!(job = %ctx.job_name, attempt = ctx.attempt, "tick failed, asking host to retry: {e}");
                WorkerOutcome::Retry
            }
        }
    }

    /// Run one tick and report what happened. Errors are returned as-is.
    pub async fn tick(&self, ctx: &JobContext) -> Result<TickReport, TickError> {
        let Some(settings) = self.settings.load().await? else {
            return Ok(TickReport::NoSettings);
        };

        let at = self.clock.now();
        let decision = evaluate(&settings, at);
        if !decision.fires() {
            if decision == Decision::InvalidDayRules {
                warn!(
                    job = %ctx.job_name,
                    "advanced day rules cannot be read; reminders stay off until a day rule is saved"
                );
            }
            return Ok(TickReport::Suppressed { at, decision });
        }

        let active = self.tasks.active_tasks().await?;
        if active.is_empty() {
            return Ok(TickReport::NoActiveTasks { at });
        }

        let counts = PrioritySummary::from_tasks(&active);
        self.alerts.emit(&Alert::for_tasks(&counts)).await?;
        info!(job = %ctx.job_name, %at, total = counts.total, "reminder sent");
        Ok(TickReport::Alerted { at, counts })
    }
}

#[async_trait]
impl JobHandler for NotificationWorker {
    async fn run(&self, ctx: &JobContext) -> WorkerOutcome {
        NotificationWorker::run(self, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tasknotify_core::{FixedClock, NotificationSettings, Priority, Task};

    #[derive(Default)]
    struct FakeSettings {
        value: Option<NotificationSettings>,
        fail: bool,
    }

    #[async_trait]
    impl SettingsStore for FakeSettings {
        async fn load(&self) -> Result<Option<NotificationSettings>, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("disk on fire".into()));
            }
            Ok(self.value.clone())
        }
        async fn save(&self, _settings: &NotificationSettings) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeTasks {
        tasks: Vec<Task>,
        fail: bool,
    }

    #[async_trait]
    impl TaskStore for FakeTasks {
        async fn all_tasks(&self) -> Result<Vec<Task>, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("locked".into()));
            }
            Ok(self.tasks.clone())
        }
        async fn get(&self, id: u64) -> Result<Option<Task>, StoreError> {
            Ok(self.tasks.iter().find(|t| t.id == id).cloned())
        }
        async fn insert(&self, _task: Task) -> Result<u64, StoreError> {
            unimplemented!()
        }
        async fn update(&self, _task: &Task) -> Result<(), StoreError> {
            unimplemented!()
        }
        async fn delete(&self, _id: u64) -> Result<bool, StoreError> {
            unimplemented!()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Alert>>,
        fail: bool,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn emit(&self, alert: &Alert) -> Result<(), AlertError> {
            if self.fail {
                return Err(AlertError("no display".into()));
            }
            self.sent.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    const WED: u8 = 3;

    fn worker(settings: FakeSettings, tasks: FakeTasks, sink: Arc<RecordingSink>, at: Moment) -> NotificationWorker {
        NotificationWorker::new(Arc::new(settings), Arc::new(tasks), sink, Arc::new(FixedClock(at)))
    }

    fn weekday_settings() -> NotificationSettings {
        NotificationSettings::default().with_simple_window(Some("07:00"), Some("16:00"), "3,4,5")
    }

    fn ctx() -> JobContext {
        JobContext::new("task_notification_job", 0)
    }

    #[tokio::test]
    async fn eligible_tick_with_tasks_sends_one_alert() {
        let sink = Arc::new(RecordingSink::default());
        let tasks = FakeTasks {
            tasks: vec![
                Task::new("a").with_priority(Priority::High),
                Task::new("b").with_priority(Priority::Low),
                Task::new("c").completed(),
            ],
            fail: false,
        };
        let w = worker(
            FakeSettings {
                value: Some(weekday_settings()),
                fail: false,
            },
            tasks,
            sink.clone(),
            Moment::at(WED, 9, 0).unwrap(),
        );

        assert_eq!(w.run(&ctx()).await, WorkerOutcome::Success);
        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].summary, "You have 2 active tasks");
        assert!(sent[0].detail.contains("High priority: 1"));
        assert!(sent[0].detail.contains("Low priority: 1"));
    }

    #[tokio::test]
    async fn zero_active_tasks_sends_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let w = worker(
            FakeSettings {
                value: Some(weekday_settings()),
                fail: false,
            },
            FakeTasks {
                tasks: vec![Task::new("done").completed()],
                fail: false,
            },
            sink.clone(),
            Moment::at(WED, 9, 0).unwrap(),
        );

        let report = w.tick(&ctx()).await.unwrap();
        assert!(matches!(report, TickReport::NoActiveTasks { .. }));
        assert_eq!(w.run(&ctx()).await, WorkerOutcome::Success);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_asks_for_retry() {
        let sink = Arc::new(RecordingSink::default());
        let w = worker(
            FakeSettings {
                value: None,
                fail: true,
            },
            FakeTasks::default(),
            sink.clone(),
            Moment::at(WED, 9, 0).unwrap(),
        );
        assert_eq!(w.run(&ctx()).await, WorkerOutcome::Retry);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn task_query_failure_asks_for_retry() {
        let sink = Arc::new(RecordingSink::default());
        let w = worker(
            FakeSettings {
                value: Some(weekday_settings()),
                fail: false,
            },
            FakeTasks {
                tasks: vec![],
                fail: true,
            },
            sink.clone(),
            Moment::at(WED, 9, 0).unwrap(),
        );
        assert_eq!(w.run(&ctx()).await, WorkerOutcome::Retry);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn alert_failure_asks_for_retry() {
        let sink = Arc::new(RecordingSink {
            sent: Mutex::new(vec![]),
            fail: true,
        });
        let w = worker(
            FakeSettings {
                value: Some(weekday_settings()),
                fail: false,
            },
            FakeTasks {
                tasks: vec![Task::new("a")],
                fail: false,
            },
            sink,
            Moment::at(WED, 9, 0).unwrap(),
        );
        assert_eq!(w.run(&ctx()).await, WorkerOutcome::Retry);
    }

    #[tokio::test]
    async fn missing_or_disabled_settings_are_a_quiet_success() {
        let sink = Arc::new(RecordingSink::default());
        let tasks = || FakeTasks {
            tasks: vec![Task::new("a")],
            fail: false,
        };
        let at = Moment::at(WED, 9, 0).unwrap();

        let none = worker(FakeSettings::default(), tasks(), sink.clone(), at);
        assert_eq!(none.tick(&ctx()).await.unwrap(), TickReport::NoSettings);

        let off = worker(
            FakeSettings {
                value: Some(weekday_settings().with_enabled(false)),
                fail: false,
            },
            tasks(),
            sink.clone(),
            at,
        );
        assert_eq!(
            off.tick(&ctx()).await.unwrap(),
            TickReport::Suppressed {
                at,
                decision: Decision::Disabled
            }
        );
        assert_eq!(off.run(&ctx()).await, WorkerOutcome::Success);
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn outside_window_is_suppressed() {
        let sink = Arc::new(RecordingSink::default());
        let at = Moment::at(WED, 6, 59).unwrap();
        let w = worker(
            FakeSettings {
                value: Some(weekday_settings()),
                fail: false,
            },
            FakeTasks {
                tasks: vec![Task::new("a")],
                fail: false,
            },
            sink.clone(),
            at,
        );
        assert_eq!(
            w.tick(&ctx()).await.unwrap(),
            TickReport::Suppressed {
                at,
                decision: Decision::OutsideWindow
            }
        );
        assert!(sink.sent.lock().unwrap().is_empty());
    }
}
