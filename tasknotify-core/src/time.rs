//! Time utilities: `HH:mm` wall-clock parsing and the moment a tick is evaluated at.

use std::fmt;

use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::day_rule::weekday_short_name;
use crate::error::ParseError;

/// Storage and display format for wall-clock times.
pub const TIME_FORMAT: &str = "%H:%M";

/// Fallback applied where user input is collected (09:00).
pub fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

/// Parse a strict `HH:mm` time of day.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, ParseError> {
    let trimmed = s.trim();
    if trimmed.len() != 5 {
        return Err(ParseError::Time(s.to_string()));
    }
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT).map_err(|_| ParseError::Time(s.to_string()))
}

/// Parse `HH:mm`, falling back to 09:00 on malformed input.
///
/// Only for input-collection boundaries. Evaluation never uses this: a bad
/// stored time there must fail closed instead.
pub fn parse_hhmm_or_default(s: &str) -> NaiveTime {
    parse_hhmm(s).unwrap_or_else(|_| default_time())
}

pub fn format_hhmm(t: NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// Weekday (Monday=1 .. Sunday=7) and minute-resolution time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub day: u8,
    pub time: NaiveTime,
}

impl Moment {
    /// Build a moment; seconds are dropped so `16:00:59` still counts as `16:00`.
    pub fn new(day: u8, time: NaiveTime) -> Self {
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
        Self { day, time }
    }

    pub fn at(day: u8, hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|t| Self::new(day, t))
    }

    pub fn from_datetime<T: TimeZone>(dt: &DateTime<T>) -> Self {
        let day = dt.weekday().number_from_monday() as u8;
        Self::new(day, dt.time())
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = weekday_short_name(self.day).unwrap_or("???");
        write!(f, "{} {}", name, format_hhmm(self.time))
    }
}

/// Source of "now" for the notification worker.
pub trait Clock: Send + Sync {
    fn now(&self) -> Moment;
}

/// Reads the system clock, either in the machine's local zone or a fixed IANA zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    tz: Option<Tz>,
}

impl SystemClock {
    pub fn local() -> Self {
        Self { tz: None }
    }

    pub fn in_zone(tz: Tz) -> Self {
        Self { tz: Some(tz) }
    }

    /// `None` means local time; otherwise an IANA name like "Europe/Berlin".
    pub fn from_config(tz: Option<&str>) -> Result<Self, ParseError> {
        match tz {
            None => Ok(Self::local()),
            Some(name) => {
                let tz: Tz = name
                    .parse()
                    .map_err(|_| ParseError::Timezone(name.to_string()))?;
                Ok(Self::in_zone(tz))
            }
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Moment {
        let now = Utc::now();
        match self.tz {
            Some(tz) => Moment::from_datetime(&now.with_timezone(&tz)),
            None => Moment::from_datetime(&now.with_timezone(&Local)),
        }
    }
}

/// Always returns the same moment.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Moment);

impl Clock for FixedClock {
    fn now(&self) -> Moment {
        self.0
    }
}
