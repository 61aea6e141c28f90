//! Recurring-job tick interval.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ParseError;

/// How often the notification job ticks.
///
/// Persisted by name (`"EVERY_2_HOURS"`). Anything else read back, unknown
/// names, numbers or `null` included, becomes [`Frequency::Every1Hour`] so a
/// bad record still yields a 60 minute job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "String")]
pub enum Frequency {
    Every30Min,
    #[default]
    Every1Hour,
    Every2Hours,
    Every3Hours,
    Every6Hours,
    Every9Hours,
}

impl Frequency {
    pub const ALL: [Frequency; 6] = [
        Frequency::Every30Min,
        Frequency::Every1Hour,
        Frequency::Every2Hours,
        Frequency::Every3Hours,
        Frequency::Every6Hours,
        Frequency::Every9Hours,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Frequency::Every30Min => 30,
            Frequency::Every1Hour => 60,
            Frequency::Every2Hours => 120,
            Frequency::Every3Hours => 180,
            Frequency::Every6Hours => 360,
            Frequency::Every9Hours => 540,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Frequency::Every30Min => "EVERY_30_MIN",
            Frequency::Every1Hour => "EVERY_1_HOUR",
            Frequency::Every2Hours => "EVERY_2_HOURS",
            Frequency::Every3Hours => "EVERY_3_HOURS",
            Frequency::Every6Hours => "EVERY_6_HOURS",
            Frequency::Every9Hours => "EVERY_9_HOURS",
        }
    }

    /// Lenient lookup used when reading persisted records.
    pub fn from_name_lossy(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .unwrap_or_default()
    }
}

impl FromStr for Frequency {
    type Err = ParseError;

    /// Strict parse for user input: accepts the stored name (any case) or a minute count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let upper = s.to_ascii_uppercase();
        if let Some(f) = Self::ALL.into_iter().find(|f| f.name() == upper) {
            return Ok(f);
        }
        if let Ok(minutes) = s.parse::<u32>() {
            if let Some(f) = Self::ALL.into_iter().find(|f| f.minutes() == minutes) {
                return Ok(f);
            }
        }
        Err(ParseError::Frequency(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for Frequency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(name) => Self::from_name_lossy(&name),
            _ => Self::default(),
        })
    }
}

impl From<Frequency> for String {
    fn from(f: Frequency) -> Self {
        f.name().to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.minutes();
        if minutes >= 60 {
            let hours = minutes / 60;
            if hours == 1 {
                write!(f, "every hour")
            } else {
                write!(f, "every {hours} hours")
            }
        } else {
            write!(f, "every {minutes} minutes")
        }
    }
}
