//! Settings and task services: what a front end calls to change state.
//!
//! Every settings write is a read-merge-write over the stored record followed
//! by a schedule re-apply, all under one writer lock, so a successful save
//! always leaves the host job in line with what was persisted.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tasknotify_core::{default_day_rules, format_weekday_set, DayRule, Frequency, NotificationSettings, Priority, Task};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::controller::{AppliedSchedule, SchedulerController};
use crate::error::{EngineError, StoreError};
use crate::propagation::{ScheduleTrigger, TriggerSender};
use crate::store::{SettingsStore, TaskStore};

/// Form state for a settings save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDraft {
    pub enabled: bool,
    pub frequency: Frequency,
    pub use_advanced_settings: bool,
    pub start_time: String,
    pub end_time: String,
    pub selected_days: Vec<u8>,
}

impl SettingsDraft {
    /// Pre-fill a draft from a stored record; missing bounds show the defaults.
    pub fn from_settings(settings: &NotificationSettings) -> Self {
        let defaults = NotificationSettings::default();
        Self {
            enabled: settings.enabled,
            frequency: settings.frequency,
            use_advanced_settings: settings.use_advanced_settings,
            start_time: settings.start_time.clone().or(defaults.start_time).unwrap_or_default(),
            end_time: settings.end_time.clone().or(defaults.end_time).unwrap_or_default(),
            selected_days: settings.weekdays().into_iter().collect(),
        }
    }

    /// Merge this draft over `base`.
    ///
    /// Simple fields are only kept while enabled in simple mode. Advanced mode
    /// keeps the stored day rules; simple mode clears them.
    pub fn merge_into(&self, base: NotificationSettings) -> NotificationSettings {
        let simple = self.enabled && !self.use_advanced_settings;
        let days: BTreeSet<u8> = self.selected_days.iter().copied().filter(|d| (1..=7).contains(d)).collect();

        NotificationSettings {
            enabled: self.enabled,
            frequency: self.frequency,
            use_advanced_settings: self.use_advanced_settings,
            start_time: simple.then(|| self.start_time.clone()),
            end_time: simple.then(|| self.end_time.clone()),
            days_of_week: if simple { format_weekday_set(&days) } else { String::new() },
            day_rules: if self.use_advanced_settings {
                base.day_rules
            } else {
                String::new()
            },
        }
    }
}

pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    controller: SchedulerController,
    triggers: Option<TriggerSender>,
    /// Held across load, merge, save and re-apply.
    write_lock: Mutex<()>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>, controller: SchedulerController) -> Self {
        Self {
            store,
            controller,
            triggers: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Also publish [`ScheduleTrigger::SettingsSaved`] after each save.
    pub fn with_triggers(mut self, triggers: TriggerSender) -> Self {
        self.triggers = Some(triggers);
        self
    }

    /// The stored record, creating and persisting the defaults on first read.
    pub async fn current(&self) -> Result<NotificationSettings, EngineError> {
        if let Some(settings) = self.store.load().await? {
            return Ok(settings);
        }
        let _guard = self.write_lock.lock().await;
        self.load_or_init().await
    }

    /// Persist `draft` merged over the freshest stored record, then re-apply.
    pub async fn save(&self, draft: &SettingsDraft) -> Result<NotificationSettings, EngineError> {
        let _guard = self.write_lock.lock().await;
        let base = self.load_or_init().await?;
        let merged = draft.merge_into(base);
        if merged.use_advanced_settings && merged.decoded_day_rules().map_or(true, |r| r.is_empty()) {
            warn!("advanced mode saved without usable day rules; reminders stay off until a day rule is saved");
        }
        self.commit(&merged).await?;
        Ok(merged)
    }

    /// Day rules for display and editing, falling back to the defaults when
    /// the stored list is empty or unreadable.
    pub async fn day_rules(&self) -> Result<Vec<DayRule>, EngineError> {
        Ok(editable_rules(&self.current().await?))
    }

    /// Replace the rule for `rule.day_of_week` and switch to advanced mode.
    pub async fn save_day_rule(&self, rule: DayRule) -> Result<NotificationSettings, EngineError> {
        if !(1..=7).contains(&rule.day_of_week) {
            return Err(EngineError::Invalid(format!("day of week {} is not in 1..7", rule.day_of_week)));
        }
        rule.window()?;

        let _guard = self.write_lock.lock().await;
        let base = self.load_or_init().await?;
        let mut rules = editable_rules(&base);
        match rules.iter_mut().find(|r| r.day_of_week == rule.day_of_week) {
            Some(slot) => *slot = rule,
            None => rules.push(rule),
        }
        rules.sort_by_key(|r| r.day_of_week);

        let settings = base.with_day_rules(&rules)?;
        self.commit(&settings).await?;
        Ok(settings)
    }

    /// Flip between simple and advanced mode without touching either config.
    pub async fn set_advanced(&self, advanced: bool) -> Result<NotificationSettings, EngineError> {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.load_or_init().await?;
        settings.use_advanced_settings = advanced;
        self.commit(&settings).await?;
        Ok(settings)
    }

    /// Caller holds `write_lock`.
    async fn load_or_init(&self) -> Result<NotificationSettings, EngineError> {
        if let Some(settings) = self.store.load().await? {
            return Ok(settings);
        }
        let defaults = NotificationSettings::default();
        self.store.save(&defaults).await?;
        info!("created default notification settings");
        Ok(defaults)
    }

    async fn commit(&self, settings: &NotificationSettings) -> Result<AppliedSchedule, EngineError> {
        self.store.save(settings).await?;
        let applied = self.controller.apply_schedule(settings).await?;
        if let Some(triggers) = &self.triggers {
            triggers.publish(ScheduleTrigger::SettingsSaved);
        }
        Ok(applied)
    }
}

fn editable_rules(settings: &NotificationSettings) -> Vec<DayRule> {
    match settings.decoded_day_rules() {
        Ok(rules) if !rules.is_empty() => rules,
        Ok(_) => default_day_rules(),
        Err(e) => {
            warn!("stored day rules unreadable, showing defaults: {e}");
            default_day_rules()
        }
    }
}

/// Field changes for [`TaskService::update`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.priority.is_none()
    }
}

pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, title: &str, description: &str, priority: Priority) -> Result<Task, EngineError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::Invalid("task title is empty".to_string()));
        }
        let mut task = Task::new(title)
            .with_description(description.trim())
            .with_priority(priority);
        task.id = self.store.insert(task.clone()).await?;
        Ok(task)
    }

    pub async fn update(&self, id: u64, edit: TaskEdit) -> Result<Task, EngineError> {
        let mut task = self.fetch(id).await?;
        if let Some(title) = edit.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(EngineError::Invalid("task title is empty".to_string()));
            }
            task.title = title.to_string();
        }
        if let Some(description) = edit.description {
            task.description = description.trim().to_string();
        }
        if let Some(priority) = edit.priority {
            task.priority = priority;
        }
        task.updated_at = Utc::now();
        self.store.update(&task).await?;
        Ok(task)
    }

    pub async fn set_completed(&self, id: u64, completed: bool) -> Result<Task, EngineError> {
        let mut task = self.fetch(id).await?;
        if task.is_completed != completed {
            task.is_completed = completed;
            task.updated_at = Utc::now();
            self.store.update(&task).await?;
        }
        Ok(task)
    }

    pub async fn delete(&self, id: u64) -> Result<(), EngineError> {
        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(StoreError::TaskNotFound(id).into())
        }
    }

    /// Tasks in listing order; completed ones only when asked for.
    pub async fn list(&self, include_completed: bool) -> Result<Vec<Task>, EngineError> {
        Ok(if include_completed {
            self.store.all_tasks().await?
        } else {
            self.store.active_tasks().await?
        })
    }

    pub async fn active(&self) -> Result<Vec<Task>, EngineError> {
        self.list(false).await
    }

    async fn fetch(&self, id: u64) -> Result<Task, EngineError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| StoreError::TaskNotFound(id).into())
    }
}
