use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod config;
mod daemon;
mod schedule_cmd;
mod settings_cmd;
mod state;
mod tasks_cmd;

use app::App;
use config::{load_config, Config};

#[derive(Parser, Debug)]
#[command(
    name = "tasknotify",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TASKNOTIFY_BUILD_SHA"), ")"),
    about = "Task list with scheduled local reminders"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create ~/.tasknotify with default settings and register the reminder job
    Init,

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: tasks_cmd::TaskCommand,
    },

    /// View or change notification settings
    Settings {
        #[command(subcommand)]
        command: settings_cmd::SettingsCommand,
    },

    /// Would a reminder fire now (or at --day/--time)?
    Check {
        /// 1-7 or a weekday name
        #[arg(long)]
        day: Option<String>,

        /// HH:mm
        #[arg(long)]
        time: Option<String>,
    },

    /// Run the reminder job once
    Tick,

    /// Re-apply the schedule from stored settings (for login/boot hooks)
    Boot,

    /// Run the scheduler in the foreground
    Daemon,

    /// List registered jobs and their run state
    Jobs,

    /// Config file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.tasknotify/config.toml with defaults (if missing)
    Init,

    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = load_config()?;
    init_tracing(&cfg);

    let app = App::open(cfg)?;

    match cli.command {
        Command::Init => {
            config::init_config()?;
            schedule_cmd::init(&app).await?;
        }
        Command::Task { command } => tasks_cmd::run(&app, command).await?,
        Command::Settings { command } => settings_cmd::run(&app, command).await?,
        Command::Check { day, time } => schedule_cmd::check(&app, day, time).await?,
        Command::Tick => schedule_cmd::tick(&app).await?,
        Command::Boot => schedule_cmd::boot(&app).await?,
        Command::Daemon => daemon::run(&app).await?,
        Command::Jobs => schedule_cmd::jobs(&app).await?,
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `[logging] filter` from config.toml.
fn init_tracing(cfg: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
