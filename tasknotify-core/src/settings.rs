//! The single notification-settings record.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::day_rule::{decode_day_rules, encode_day_rules, format_weekday_set, parse_weekday_set, DayRule};
use crate::error::ParseError;
use crate::frequency::Frequency;

/// Persisted notification configuration. There is exactly one per store and
/// it is always written whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    pub frequency: Frequency,
    pub use_advanced_settings: bool,

    /// Simple mode window. `None` on either side disables the time check.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Simple mode weekdays, e.g. `"1,2,3,4,5"`.
    pub days_of_week: String,

    /// Advanced mode: JSON array of [`DayRule`], kept serialized.
    pub day_rules: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: Frequency::Every1Hour,
            use_advanced_settings: false,
            start_time: Some("09:00".to_string()),
            end_time: Some("18:00".to_string()),
            days_of_week: "1,2,3,4,5".to_string(),
            day_rules: "[]".to_string(),
        }
    }
}

impl NotificationSettings {
    pub fn interval_minutes(&self) -> u32 {
        self.frequency.minutes()
    }

    pub fn weekdays(&self) -> BTreeSet<u8> {
        parse_weekday_set(&self.days_of_week)
    }

    pub fn decoded_day_rules(&self) -> Result<Vec<DayRule>, ParseError> {
        decode_day_rules(&self.day_rules)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Switch to simple mode with the given window and weekday list.
    pub fn with_simple_window(mut self, start: Option<&str>, end: Option<&str>, days: &str) -> Self {
        self.use_advanced_settings = false;
        self.start_time = start.map(str::to_string);
        self.end_time = end.map(str::to_string);
        self.days_of_week = days.to_string();
        self
    }

    pub fn with_weekdays(mut self, days: &BTreeSet<u8>) -> Self {
        self.days_of_week = format_weekday_set(days);
        self
    }

    /// Switch to advanced mode with the given rules.
    pub fn with_day_rules(mut self, rules: &[DayRule]) -> Result<Self, ParseError> {
        self.day_rules = encode_day_rules(rules)?;
        self.use_advanced_settings = true;
        Ok(self)
    }
}
