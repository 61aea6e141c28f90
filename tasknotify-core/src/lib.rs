//! tasknotify-core: schedule model and eligibility rules for task reminders.

pub mod day_rule;
pub mod eligibility;
pub mod error;
pub mod frequency;
pub mod settings;
pub mod task;
pub mod time;

pub use day_rule::{
    decode_day_rules, default_day_rules, encode_day_rules, format_weekday_set, parse_weekday,
    parse_weekday_set, weekday_name, DayRule,
};
pub use eligibility::{evaluate, should_notify, Decision};
pub use error::ParseError;
pub use frequency::Frequency;
pub use settings::NotificationSettings;
pub use task::{sort_for_listing, Priority, PrioritySummary, Task};
pub use time::{format_hhmm, parse_hhmm, parse_hhmm_or_default, Clock, FixedClock, Moment, SystemClock};
