//! Change propagation: re-apply the schedule whenever something may have
//! moved the settings out from under the host job.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::controller::{AppliedSchedule, SchedulerController};
use crate::error::EngineError;
use crate::store::SettingsStore;

/// Why the schedule is being re-applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTrigger {
    /// Process start.
    Startup,
    /// A settings save completed somewhere in the process.
    SettingsSaved,
    /// Host restart or boot completion.
    Restart,
}

/// Publishing half of the process-wide trigger channel.
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: mpsc::UnboundedSender<ScheduleTrigger>,
}

impl TriggerSender {
    /// Publish a trigger. A closed channel only means nobody is listening.
    pub fn publish(&self, trigger: ScheduleTrigger) {
        if self.tx.send(trigger).is_err() {
            debug!(?trigger, "no schedule listener; trigger dropped");
        }
    }
}

pub fn trigger_channel() -> (TriggerSender, mpsc::UnboundedReceiver<ScheduleTrigger>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TriggerSender { tx }, rx)
}

/// The single consumer of [`ScheduleTrigger`]s.
pub struct ChangePropagator {
    settings: Arc<dyn SettingsStore>,
    controller: SchedulerController,
}

impl ChangePropagator {
    pub fn new(settings: Arc<dyn SettingsStore>, controller: SchedulerController) -> Self {
        Self { settings, controller }
    }

    /// Load the stored settings and apply them.
    ///
    /// With no stored record there is nothing to remind about yet, so any
    /// leftover job is cancelled.
    pub async fn handle(&self, trigger: ScheduleTrigger) -> Result<AppliedSchedule, EngineError> {
        let applied = match self.settings.load().await? {
            Some(settings) => self.controller.apply_schedule(&settings).await?,
            None => self.controller.cancel().await?,
        };
        info!(?trigger, ?applied, "schedule re-applied");
        Ok(applied)
    }

    /// Consume triggers until every sender is dropped.
    pub fn spawn(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<ScheduleTrigger>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(trigger) = rx.recv().await {
                if let Err(e) = self.handle(trigger).await {
                    error!(?trigger, "cannot re-apply schedule: {e}");
                }
            }
            debug!("schedule trigger channel closed");
        })
    }
}
