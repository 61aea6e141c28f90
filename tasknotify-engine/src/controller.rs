//! Scheduler controller: keeps the host's recurring job in line with settings.

use std::sync::Arc;

use tasknotify_core::NotificationSettings;
use tracing::info;

use crate::error::ScheduleError;
use crate::host::{JobScheduler, RecurringJob, NOTIFICATION_JOB_NAME};

/// What [`SchedulerController::apply_schedule`] left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedSchedule {
    Cancelled,
    Scheduled { interval_minutes: u32 },
}

#[derive(Clone)]
pub struct SchedulerController {
    scheduler: Arc<dyn JobScheduler>,
}

impl SchedulerController {
    pub fn new(scheduler: Arc<dyn JobScheduler>) -> Self {
        Self { scheduler }
    }

    /// The job these settings call for, or `None` when notifications are off.
    pub fn job_for(settings: &NotificationSettings) -> Option<RecurringJob> {
        settings
            .enabled
            .then(|| RecurringJob::notification(settings.interval_minutes()))
    }

    /// Make the host hold exactly the job `settings` call for.
    ///
    /// Idempotent. Enabling replaces any existing job of the same name in a
    /// single upsert, so there is never a moment with zero or two jobs.
    pub async fn apply_schedule(&self, settings: &NotificationSettings) -> Result<AppliedSchedule, ScheduleError> {
        match Self::job_for(settings) {
            None => self.cancel().await,
            Some(job) => {
                let interval_minutes = job.interval_minutes;
                self.scheduler.upsert(job).await?;
                info!(
                    job = NOTIFICATION_JOB_NAME,
                    interval_minutes,
                    frequency = settings.frequency.name(),
                    "recurring job scheduled"
                );
                Ok(AppliedSchedule::Scheduled { interval_minutes })
            }
        }
    }

    /// Remove the reminder job, leaving nothing scheduled.
    pub async fn cancel(&self) -> Result<AppliedSchedule, ScheduleError> {
        self.scheduler.cancel(NOTIFICATION_JOB_NAME).await?;
        info!(job = NOTIFICATION_JOB_NAME, "recurring job cancelled");
        Ok(AppliedSchedule::Cancelled)
    }
}
