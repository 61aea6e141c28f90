use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use tasknotify_engine::{trigger_channel, ScheduleTrigger};

use crate::app::App;

/// Run the job runner and the schedule listener until Ctrl-C or SIGTERM.
///
/// SIGHUP re-applies the schedule from stored settings.
pub async fn run(app: &App) -> Result<()> {
    let (triggers, rx) = trigger_channel();
    let listener = Arc::new(app.propagator()).spawn(rx);
    triggers.publish(ScheduleTrigger::Startup);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = tokio::spawn(app.runner()?.run(shutdown_rx));
    info!(home = %app.paths.home().display(), "daemon started");

    wait_for_shutdown(|| triggers.publish(ScheduleTrigger::Restart)).await?;

    let _ = shutdown_tx.send(true);
    runner.await.context("job runner task")?;
    drop(triggers);
    listener.await.context("schedule listener task")?;
    info!("daemon stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown(on_hangup: impl Fn()) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).context("install SIGTERM handler")?;
    let mut hangup = signal(SignalKind::hangup()).context("install SIGHUP handler")?;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res.context("wait for Ctrl-C")?;
                info!("received Ctrl-C, shutting down");
                return Ok(());
            }
            _ = terminate.recv() => {
                info!("received SIGTERM, shutting down");
                return Ok(());
            }
            _ = hangup.recv() => {
                info!("received SIGHUP, re-applying schedule");
                on_hangup();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_on_hangup: impl Fn()) -> Result<()> {
    tokio::signal::ctrl_c().await.context("wait for Ctrl-C")?;
    info!("received Ctrl-C, shutting down");
    Ok(())
}
