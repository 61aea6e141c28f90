//! Eligibility evaluator: may a reminder fire at this moment?
//!
//! Pure and infallible. Every malformed stored value resolves to "do not fire"
//! for the affected check; nothing here returns an error or panics.

use std::fmt;

use chrono::NaiveTime;

use crate::settings::NotificationSettings;
use crate::time::{parse_hhmm, Moment};

/// Outcome of an evaluation, with the reason when it does not fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Fire,
    Disabled,
    /// Advanced rules could not be decoded.
    InvalidDayRules,
    /// No enabled advanced rule for today.
    NoRuleForDay,
    /// Simple mode and today is not a selected weekday.
    DayNotSelected,
    /// A window bound for today is not a valid `HH:mm`.
    InvalidTime,
    OutsideWindow,
}

impl Decision {
    pub fn fires(self) -> bool {
        self == Decision::Fire
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Decision::Fire => "within the notification window",
            Decision::Disabled => "notifications are disabled",
            Decision::InvalidDayRules => "advanced day rules are unreadable",
            Decision::NoRuleForDay => "no enabled rule for this day",
            Decision::DayNotSelected => "this day is not selected",
            Decision::InvalidTime => "the configured window has an invalid time",
            Decision::OutsideWindow => "outside the configured time window",
        };
        f.write_str(s)
    }
}

pub fn should_notify(settings: &NotificationSettings, now: Moment) -> bool {
    evaluate(settings, now).fires()
}

pub fn evaluate(settings: &NotificationSettings, now: Moment) -> Decision {
    if !settings.enabled {
        return Decision::Disabled;
    }
    if settings.use_advanced_settings {
        evaluate_advanced(settings, now)
    } else {
        evaluate_simple(settings, now)
    }
}

fn evaluate_advanced(settings: &NotificationSettings, now: Moment) -> Decision {
    let rules = match settings.decoded_day_rules() {
        Ok(rules) => rules,
        Err(_) => return Decision::InvalidDayRules,
    };

    // First enabled rule for the day wins if the list has duplicates.
    let Some(rule) = rules
        .iter()
        .find(|r| r.day_of_week == now.day && r.enabled)
    else {
        return Decision::NoRuleForDay;
    };

    match rule.window() {
        Ok((start, end)) => window_decision(now.time, start, end),
        Err(_) => Decision::InvalidTime,
    }
}

fn evaluate_simple(settings: &NotificationSettings, now: Moment) -> Decision {
    if !settings.weekdays().contains(&now.day) {
        return Decision::DayNotSelected;
    }

    let (Some(start), Some(end)) = (settings.start_time.as_deref(), settings.end_time.as_deref()) else {
        return Decision::Fire;
    };

    match (parse_hhmm(start), parse_hhmm(end)) {
        (Ok(start), Ok(end)) => window_decision(now.time, start, end),
        _ => Decision::InvalidTime,
    }
}

/// Closed window: both bounds count as inside. An inverted window never matches.
fn window_decision(t: NaiveTime, start: NaiveTime, end: NaiveTime) -> Decision {
    if t < start || t > end {
        Decision::OutsideWindow
    } else {
        Decision::Fire
    }
}
