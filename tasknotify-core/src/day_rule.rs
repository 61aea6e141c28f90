//! Day-schedule model: per-weekday windows and the simple-mode weekday set.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::time::parse_hhmm;

const WEEKDAYS: [(&str, &str); 7] = [
    ("Monday", "Mon"),
    ("Tuesday", "Tue"),
    ("Wednesday", "Wed"),
    ("Thursday", "Thu"),
    ("Friday", "Fri"),
    ("Saturday", "Sat"),
    ("Sunday", "Sun"),
];

/// Advanced-mode window for one weekday (Monday=1 .. Sunday=7).
///
/// Times stay as the stored `HH:mm` strings; they are parsed at evaluation
/// time so a corrupt value can fail closed for that day only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRule {
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "rule_enabled_default")]
    pub enabled: bool,
}

fn rule_enabled_default() -> bool {
    true
}

impl DayRule {
    pub fn new(day_of_week: u8, start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            day_of_week,
            start_time: start_time.into(),
            end_time: end_time.into(),
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn display_name(&self) -> String {
        weekday_name(self.day_of_week)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Day {}", self.day_of_week))
    }

    /// Parsed `[start, end]` window, inclusive on both ends.
    pub fn window(&self) -> Result<(NaiveTime, NaiveTime), ParseError> {
        Ok((parse_hhmm(&self.start_time)?, parse_hhmm(&self.end_time)?))
    }
}

/// Fallback schedule shown to the user before any advanced configuration exists.
pub fn default_day_rules() -> Vec<DayRule> {
    vec![
        DayRule::new(1, "13:00", "22:00"),
        DayRule::new(2, "13:00", "22:00"),
        DayRule::new(3, "07:00", "16:00"),
        DayRule::new(4, "07:00", "16:00"),
        DayRule::new(5, "07:00", "16:00"),
        DayRule::new(6, "10:00", "16:00"),
        DayRule::new(7, "10:00", "16:00"),
    ]
}

/// Serialize rules to the JSON array stored in the settings record.
pub fn encode_day_rules(rules: &[DayRule]) -> Result<String, ParseError> {
    serde_json::to_string(rules).map_err(|e| ParseError::DayRules(e.to_string()))
}

pub fn decode_day_rules(raw: &str) -> Result<Vec<DayRule>, ParseError> {
    serde_json::from_str(raw).map_err(|e| ParseError::DayRules(e.to_string()))
}

pub fn weekday_name(day: u8) -> Option<&'static str> {
    day.checked_sub(1)
        .and_then(|i| WEEKDAYS.get(i as usize))
        .map(|(long, _)| *long)
}

pub fn weekday_short_name(day: u8) -> Option<&'static str> {
    day.checked_sub(1)
        .and_then(|i| WEEKDAYS.get(i as usize))
        .map(|(_, short)| *short)
}

/// Parse a weekday given as `1`-`7` or an English name/abbreviation.
pub fn parse_weekday(s: &str) -> Result<u8, ParseError> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        if (1..=7).contains(&n) {
            return Ok(n);
        }
        return Err(ParseError::Weekday(s.to_string()));
    }
    let lower = s.to_ascii_lowercase();
    WEEKDAYS
        .iter()
        .position(|(long, short)| long.to_ascii_lowercase() == lower || short.to_ascii_lowercase() == lower)
        .map(|i| i as u8 + 1)
        .ok_or_else(|| ParseError::Weekday(s.to_string()))
}

/// Parse the comma-separated simple-mode weekday list.
///
/// Empty or unparsable tokens are skipped, as are numbers outside 1..=7.
pub fn parse_weekday_set(raw: &str) -> BTreeSet<u8> {
    raw.split(',')
        .filter_map(|tok| tok.trim().parse::<u8>().ok())
        .filter(|d| (1..=7).contains(d))
        .collect()
}

pub fn format_weekday_set(days: &BTreeSet<u8>) -> String {
    days.iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_rules_round_trip() {
        let rules = vec![
            DayRule::new(6, "10:00", "16:00"),
            DayRule::new(7, "11:30", "12:45").with_enabled(false),
        ];
        let raw = encode_day_rules(&rules).unwrap();
        assert_eq!(decode_day_rules(&raw).unwrap(), rules);
    }

    #[test]
    fn stored_shape_uses_camel_case() {
        let raw = encode_day_rules(&[DayRule::new(1, "13:00", "22:00")]).unwrap();
        assert_eq!(
            raw,
            r#"[{"dayOfWeek":1,"startTime":"13:00","endTime":"22:00","enabled":true}]"#
        );
    }

    #[test]
    fn missing_enabled_defaults_to_true() {
        let rules = decode_day_rules(r#"[{"dayOfWeek":2,"startTime":"08:00","endTime":"09:00"}]"#).unwrap();
        assert!(rules[0].enabled);
    }

    #[test]
    fn corrupt_or_empty_rules_fail_to_decode() {
        assert!(decode_day_rules("").is_err());
        assert!(decode_day_rules("{not json").is_err());
        assert!(decode_day_rules("[]").unwrap().is_empty());
    }

    #[test]
    fn defaults_cover_every_weekday_once() {
        let days: Vec<u8> = default_day_rules().iter().map(|r| r.day_of_week).collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(default_day_rules()[0].start_time, "13:00");
        assert_eq!(default_day_rules()[5].end_time, "16:00");
    }

    #[test]
    fn weekday_set_skips_bad_tokens() {
        let set = parse_weekday_set("5, 1,,x,3,9,3");
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert!(parse_weekday_set("").is_empty());
    }

    #[test]
    fn weekday_names() {
        assert_eq!(parse_weekday("sat").unwrap(), 6);
        assert_eq!(parse_weekday("Monday").unwrap(), 1);
        assert_eq!(parse_weekday("7").unwrap(), 7);
        assert!(parse_weekday("0").is_err());
        assert!(parse_weekday("someday").is_err());
        assert_eq!(DayRule::new(9, "09:00", "10:00").display_name(), "Day 9");
    }
}
