//! tasknotify-engine: stores, host capabilities, and the scheduling engine
//! that keeps one recurring reminder job in line with the settings.

pub mod alert;
pub mod controller;
pub mod error;
pub mod host;
pub mod propagation;
pub mod registry;
pub mod runner;
pub mod service;
pub mod store;
pub mod worker;

pub use alert::{Alert, AlertError, AlertSink, AlertSinkKind, DesktopAlertSink, LogAlertSink, StdoutAlertSink};
pub use controller::{AppliedSchedule, SchedulerController};
pub use error::{EngineError, ScheduleError, StoreError};
pub use host::{
    JobConstraints, JobContext, JobHandler, JobScheduler, MemoryJobScheduler, NetworkRequirement, RecurringJob,
    WorkerOutcome, NOTIFICATION_JOB_NAME, NOTIFICATION_JOB_TAG,
};
pub use propagation::{trigger_channel, ChangePropagator, ScheduleTrigger, TriggerSender};
pub use registry::{FileJobRegistry, JobRecord};
pub use runner::{JobRun, JobRunner, RetryPolicy};
pub use service::{SettingsDraft, SettingsService, TaskEdit, TaskService};
pub use store::{JsonSettingsStore, JsonTaskStore, SettingsStore, TaskStore};
pub use worker::{NotificationWorker, TickError, TickReport};
