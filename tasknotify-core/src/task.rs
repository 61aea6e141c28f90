//! Task records and the priority breakdown used in reminder alerts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" | "H" => Ok(Priority::High),
            "MEDIUM" | "MED" | "M" => Ok(Priority::Medium),
            "LOW" | "L" => Ok(Priority::Low),
            _ => Err(ParseError::Priority(s.to_string())),
        }
    }
}

/// A to-do item. `id` is assigned by the task store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            created_at: now,
            updated_at: now,
            is_completed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }

    pub fn is_active(&self) -> bool {
        !self.is_completed
    }
}

/// Listing order: HIGH first, then newest first within a priority.
pub fn sort_for_listing(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Counts reported in a reminder alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrioritySummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PrioritySummary {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut out = Self::default();
        for t in tasks {
            out.total += 1;
            match t.priority {
                Priority::High => out.high += 1,
                Priority::Medium => out.medium += 1,
                Priority::Low => out.low += 1,
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn summary_counts_by_priority() {
        let tasks = vec![
            Task::new("a").with_priority(Priority::High),
            Task::new("b").with_priority(Priority::High),
            Task::new("c"),
            Task::new("d").with_priority(Priority::Low),
        ];
        let s = PrioritySummary::from_tasks(&tasks);
        assert_eq!(
            s,
            PrioritySummary {
                total: 4,
                high: 2,
                medium: 1,
                low: 1
            }
        );
    }

    #[test]
    fn listing_is_priority_then_newest() {
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut tasks = vec![
            Task::new("old-low").with_priority(Priority::Low).with_created_at(t0),
            Task::new("old-high").with_priority(Priority::High).with_created_at(t0),
            Task::new("new-high").with_priority(Priority::High).with_created_at(t1),
            Task::new("medium").with_created_at(t1),
        ];
        sort_for_listing(&mut tasks);
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["new-high", "old-high", "medium", "old-low"]);
    }

    #[test]
    fn priority_parsing() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("M".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(serde_json::to_string(&Priority::Low).unwrap(), "\"LOW\"");
    }
}
