use anyhow::{Context, Result};
use chrono::Utc;
use tasknotify_core::{evaluate, parse_hhmm, parse_weekday, Moment};
use tasknotify_engine::{
    AppliedSchedule, JobContext, JobRecord, ScheduleTrigger, SettingsStore, TickReport, NOTIFICATION_JOB_NAME,
};

use crate::app::App;

/// Create the settings record if needed and register the job it calls for.
pub async fn init(app: &App) -> Result<()> {
    let settings = app.settings_service().current().await?;
    let applied = app.controller().apply_schedule(&settings).await?;
    println!("Home: {}", app.paths.home().display());
    println!("{}", describe_applied(applied));
    Ok(())
}

/// Dry-run the eligibility check, at now or at the given weekday/time.
pub async fn check(app: &App, day: Option<String>, time: Option<String>) -> Result<()> {
    let now = app.clock()?.now();
    let at = Moment::new(
        match day {
            Some(d) => parse_weekday(&d)?,
            None => now.day,
        },
        match time {
            Some(t) => parse_hhmm(&t)?,
            None => now.time,
        },
    );

    let Some(settings) = app.settings.load().await? else {
        println!("{at}: no settings saved yet (run `tasknotify init`)");
        return Ok(());
    };
    let decision = evaluate(&settings, at);
    let verdict = if decision.fires() { "would notify" } else { "quiet" };
    println!("{at}: {verdict} ({decision})");
    Ok(())
}

/// Run the reminder worker once, outside the runner.
pub async fn tick(app: &App) -> Result<()> {
    let worker = app.worker(app.clock()?, app.alert_sink());
    let report = worker
        .tick(&JobContext::new(NOTIFICATION_JOB_NAME, 0))
        .await
        .context("reminder tick")?;
    println!("{}", describe_tick(&report));
    Ok(())
}

/// Restart signal: re-apply the schedule from stored settings.
pub async fn boot(app: &App) -> Result<()> {
    let applied = app.propagator().handle(ScheduleTrigger::Restart).await?;
    println!("{}", describe_applied(applied));
    Ok(())
}

pub async fn jobs(app: &App) -> Result<()> {
    let jobs = app.registry.jobs().await?;
    if jobs.is_empty() {
        println!("No jobs registered.");
        return Ok(());
    }
    for r in &jobs {
        println!("{}", describe_job(r));
    }
    Ok(())
}

pub fn describe_applied(applied: AppliedSchedule) -> String {
    match applied {
        AppliedSchedule::Cancelled => "Reminders off: no job scheduled.".to_string(),
        AppliedSchedule::Scheduled { interval_minutes } => {
            format!("Reminder job scheduled every {interval_minutes} minutes.")
        }
    }
}

pub fn describe_tick(report: &TickReport) -> String {
    match report {
        TickReport::NoSettings => "No settings saved; nothing to do.".to_string(),
        TickReport::Suppressed { at, decision } => format!("{at}: no reminder ({decision})"),
        TickReport::NoActiveTasks { at } => format!("{at}: no active tasks"),
        TickReport::Alerted { at, counts } => format!("{at}: reminder sent for {} active tasks", counts.total),
    }
}

pub fn describe_job(r: &JobRecord) -> String {
    let last = r
        .last_run
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    let next = r.next_run().max(Utc::now());
    let mut line = format!(
        "{}  every {} min  last run: {}  next: {}",
        r.job.name,
        r.job.interval_minutes,
        last,
        next.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if r.retry_at.is_some() {
        line.push_str(&format!("  (retry {} pending)", r.retry_attempt));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasknotify_core::{Decision, PrioritySummary};
    use tasknotify_engine::RecurringJob;

    #[test]
    fn tick_descriptions() {
        let at = Moment::at(3, 8, 0).unwrap();
        assert_eq!(
            describe_tick(&TickReport::Suppressed {
                at,
                decision: Decision::OutsideWindow
            }),
            "Wed 08:00: no reminder (outside the configured time window)"
        );
        let counts = PrioritySummary {
            total: 2,
            high: 1,
            medium: 1,
            low: 0,
        };
        assert_eq!(
            describe_tick(&TickReport::Alerted { at, counts }),
            "Wed 08:00: reminder sent for 2 active tasks"
        );
    }

    #[test]
    fn job_description_shows_pending_retry() {
        let mut r = JobRecord::new(RecurringJob::notification(60), Utc::now());
        assert!(describe_job(&r).contains("last run: never"));
        r.retry_attempt = 2;
        r.retry_at = Some(Utc::now());
        assert!(describe_job(&r).contains("(retry 2 pending)"));
    }

    fn temp_app(dir: &tempfile::TempDir) -> App {
        let mut cfg = crate::config::Config::default();
        cfg.alerts.sink = tasknotify_engine::AlertSinkKind::Log;
        App::at(crate::state::Paths::new(dir.path()), cfg)
    }

    #[tokio::test]
    async fn init_then_boot_keeps_one_job() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = temp_app(&dir);

        init(&app).await.unwrap();
        assert!(app.paths.settings().exists());
        assert_eq!(app.registry.jobs().await.unwrap().len(), 1);

        boot(&app).await.unwrap();
        let jobs = app.registry.jobs().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.interval_minutes, 60);
    }

    #[tokio::test]
    async fn check_and_tick_work_before_init() {
        let dir = tempfile::TempDir::new().unwrap();
        let app = temp_app(&dir);
        check(&app, Some("sat".into()), Some("10:00".into())).await.unwrap();
        tick(&app).await.unwrap();
        assert!(check(&app, Some("funday".into()), None).await.is_err());
    }

    #[test]
    fn applied_descriptions() {
        assert_eq!(
            describe_applied(AppliedSchedule::Scheduled { interval_minutes: 120 }),
            "Reminder job scheduled every 120 minutes."
        );
    }
}
