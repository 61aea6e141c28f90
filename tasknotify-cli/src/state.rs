use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "TASKNOTIFY_HOME";

/// `$TASKNOTIFY_HOME`, or `~/.tasknotify`.
pub fn tasknotify_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tasknotify"))
}

pub fn ensure_home() -> Result<PathBuf> {
    let dir = tasknotify_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Where each persisted file lives under a home directory.
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn settings(&self) -> PathBuf {
        self.home.join("settings.json")
    }

    pub fn tasks(&self) -> PathBuf {
        self.home.join("tasks.json")
    }

    pub fn jobs(&self) -> PathBuf {
        self.home.join("jobs.json")
    }

    pub fn config(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}
