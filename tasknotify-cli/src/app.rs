use anyhow::Result;
use std::sync::Arc;

use tasknotify_core::Clock;
use tasknotify_engine::{
    AlertSink, ChangePropagator, FileJobRegistry, JobRunner, JsonSettingsStore, JsonTaskStore, NotificationWorker,
    SchedulerController, SettingsService, TaskService, NOTIFICATION_JOB_NAME,
};

use crate::config::Config;
use crate::state::{ensure_home, Paths};

/// Stores and services rooted at one home directory.
pub struct App {
    pub paths: Paths,
    pub config: Config,
    pub settings: Arc<JsonSettingsStore>,
    pub tasks: Arc<JsonTaskStore>,
    pub registry: Arc<FileJobRegistry>,
}

impl App {
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self::at(Paths::new(ensure_home()?), config))
    }

    pub fn at(paths: Paths, config: Config) -> Self {
        Self {
            settings: Arc::new(JsonSettingsStore::new(paths.settings())),
            tasks: Arc::new(JsonTaskStore::new(paths.tasks())),
            registry: Arc::new(FileJobRegistry::new(paths.jobs())),
            paths,
            config,
        }
    }

    pub fn controller(&self) -> SchedulerController {
        SchedulerController::new(self.registry.clone())
    }

    pub fn settings_service(&self) -> SettingsService {
        SettingsService::new(self.settings.clone(), self.controller())
    }

    pub fn task_service(&self) -> TaskService {
        TaskService::new(self.tasks.clone())
    }

    pub fn propagator(&self) -> ChangePropagator {
        ChangePropagator::new(self.settings.clone(), self.controller())
    }

    pub fn clock(&self) -> Result<Arc<dyn Clock>> {
        Ok(Arc::new(self.config.clock()?))
    }

    pub fn alert_sink(&self) -> Arc<dyn AlertSink> {
        self.config.alerts.sink.build()
    }

    pub fn worker(&self, clock: Arc<dyn Clock>, alerts: Arc<dyn AlertSink>) -> NotificationWorker {
        NotificationWorker::new(self.settings.clone(), self.tasks.clone(), alerts, clock)
    }

    /// Runner with the reminder worker wired in, tuned from `[scheduler]`.
    pub fn runner(&self) -> Result<JobRunner> {
        let worker = self.worker(self.clock()?, self.alert_sink());
        Ok(JobRunner::new(self.registry.clone())
            .with_handler(NOTIFICATION_JOB_NAME, Arc::new(worker))
            .with_tick_interval(self.config.tick_interval())
            .with_retry_policy(self.config.retry_policy()))
    }
}
