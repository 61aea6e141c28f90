use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tasknotify_core::SystemClock;
use tasknotify_engine::{AlertSinkKind, RetryPolicy};

use crate::state::{ensure_home, Paths};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralSection,
    pub scheduler: SchedulerSection,
    pub alerts: AlertsSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSection {
    /// IANA zone used for reminder windows. Unset means the machine's local time.
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    /// How often the daemon checks for due jobs.
    pub tick_seconds: u64,
    pub max_retries: u32,
    /// First retry delay; doubled for each further attempt.
    pub retry_backoff_seconds: i64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            tick_seconds: 30,
            max_retries: 3,
            retry_backoff_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsSection {
    pub sink: AlertSinkKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn clock(&self) -> Result<SystemClock> {
        SystemClock::from_config(self.general.timezone.as_deref()).context("config [general] timezone")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.scheduler.max_retries,
            base_backoff: chrono::Duration::seconds(self.scheduler.retry_backoff_seconds.max(1)),
        }
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scheduler.tick_seconds.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(Paths::new(ensure_home()?).config())
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    let origin = if p.exists() { "" } else { " (not written yet; defaults)" };
    println!("# {}{}", p.display(), origin);
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.scheduler.tick_seconds, 30);
        assert_eq!(cfg.alerts.sink, AlertSinkKind::Desktop);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let p = dir.path().join("config.toml");
        fs::write(
            &p,
            "[general]\ntimezone = \"Europe/Berlin\"\n\n[alerts]\nsink = \"stdout\"\n\n[scheduler]\nmax_retries = 5\n",
        )
        .unwrap();

        let cfg = load_config_from(&p).unwrap();
        assert_eq!(cfg.general.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(cfg.alerts.sink, AlertSinkKind::Stdout);
        assert_eq!(cfg.scheduler.max_retries, 5);
        assert_eq!(cfg.scheduler.retry_backoff_seconds, 60);
        assert_eq!(cfg.logging.filter, "info");
        assert!(cfg.clock().is_ok());
    }

    #[test]
    fn unknown_timezone_is_reported() {
        let mut cfg = Config::default();
        cfg.general.timezone = Some("Mars/Olympus".into());
        assert!(cfg.clock().is_err());
    }

    #[test]
    fn default_config_serializes_to_toml_and_back() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(s.contains("[scheduler]"));
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back, Config::default());
    }
}
