//! Reminder alert text and the sinks that deliver it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tasknotify_core::PrioritySummary;
use tracing::info;

/// One reminder: a short line plus a multi-line breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub summary: String,
    pub detail: String,
}

impl Alert {
    pub const TITLE: &'static str = "Current tasks";

    pub fn for_tasks(counts: &PrioritySummary) -> Self {
        let noun = if counts.total == 1 { "task" } else { "tasks" };
        Self {
            summary: format!("You have {} active {noun}", counts.total),
            detail: format!(
                "Total tasks: {}\nHigh priority: {}\nMedium priority: {}\nLow priority: {}\nOpen the task list to review them.",
                counts.total, counts.high, counts.medium, counts.low
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("alert delivery failed: {0}")]
pub struct AlertError(pub String);

/// Host alert dispatcher.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn emit(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Which sink the CLI host wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSinkKind {
    #[default]
    Desktop,
    Log,
    Stdout,
}

impl AlertSinkKind {
    pub fn build(self) -> Arc<dyn AlertSink> {
        match self {
            AlertSinkKind::Desktop => Arc::new(DesktopAlertSink),
            AlertSinkKind::Log => Arc::new(LogAlertSink),
            AlertSinkKind::Stdout => Arc::new(StdoutAlertSink),
        }
    }
}

/// Writes alerts to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn emit(&self, alert: &Alert) -> Result<(), AlertError> {
        info!(summary = %alert.summary, detail = %alert.detail, "task reminder");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutAlertSink;

#[async_trait]
impl AlertSink for StdoutAlertSink {
    async fn emit(&self, alert: &Alert) -> Result<(), AlertError> {
        println!("{}: {}\n{}", Alert::TITLE, alert.summary, alert.detail);
        Ok(())
    }
}

/// Desktop notification via `osascript` on macOS and `notify-send` elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopAlertSink;

#[async_trait]
impl AlertSink for DesktopAlertSink {
    async fn emit(&self, alert: &Alert) -> Result<(), AlertError> {
        let mut cmd = if cfg!(target_os = "macos") {
            let script = format!(
                r#"display notification "{}" with title "{}" subtitle "{}""#,
                escape_applescript(&alert.detail),
                escape_applescript(Alert::TITLE),
                escape_applescript(&alert.summary),
            );
            let mut c = tokio::process::Command::new("osascript");
            c.arg("-e").arg(script);
            c
        } else {
            let mut c = tokio::process::Command::new("notify-send");
            c.args(["--app-name", "tasknotify", "--urgency", "normal"])
                .arg(format!("{}: {}", Alert::TITLE, alert.summary))
                .arg(&alert.detail);
            c
        };

        let output = cmd
            .output()
            .await
            .map_err(|e| AlertError(format!("spawning notifier: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AlertError(format!("notifier exited with {}: {}", output.status, stderr.trim())));
        }
        Ok(())
    }
}

fn escape_applescript(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
