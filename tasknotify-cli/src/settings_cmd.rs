use anyhow::Result;
use clap::{Subcommand, ValueEnum};
use tasknotify_core::{
    format_hhmm, parse_hhmm, parse_hhmm_or_default, parse_weekday, weekday_name, DayRule, Frequency,
    NotificationSettings,
};
use tasknotify_engine::SettingsDraft;

use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print the stored notification settings
    Show,

    /// Change simple-mode settings (unset flags keep their current value)
    Set {
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,

        /// EVERY_30_MIN .. EVERY_9_HOURS, or a minute count (30, 60, 120, 180, 360, 540)
        #[arg(long)]
        frequency: Option<Frequency>,

        /// Window start, HH:mm
        #[arg(long)]
        start: Option<String>,

        /// Window end, HH:mm
        #[arg(long)]
        end: Option<String>,

        /// Weekdays, e.g. "1,2,3,4,5" or "mon,wed,fri"
        #[arg(long)]
        days: Option<String>,

        /// Switch to simple mode as part of this save
        #[arg(long, default_value_t = false)]
        simple: bool,
    },

    /// Set the advanced-mode window for one weekday
    Day {
        /// 1-7 or a weekday name
        day: String,

        /// HH:mm
        start: String,

        /// HH:mm
        end: String,

        /// Keep the window but skip reminders on this day
        #[arg(long, default_value_t = false)]
        off: bool,
    },

    /// Turn advanced (per-day) mode on or off
    Advanced { mode: Switch },

    /// List the advanced-mode day rules
    Days,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

pub async fn run(app: &App, cmd: SettingsCommand) -> Result<()> {
    let svc = app.settings_service();
    match cmd {
        SettingsCommand::Show => {
            let settings = svc.current().await?;
            let rules = svc.day_rules().await?;
            print!("{}", render_settings(&settings, &rules));
        }
        SettingsCommand::Set {
            enable,
            disable,
            frequency,
            start,
            end,
            days,
            simple,
        } => {
            let window_given = start.is_some() || end.is_some() || days.is_some();
            let mut draft = SettingsDraft::from_settings(&svc.current().await?);
            if enable {
                draft.enabled = true;
            }
            if disable {
                draft.enabled = false;
            }
            if let Some(f) = frequency {
                draft.frequency = f;
            }
            if let Some(s) = start {
                draft.start_time = input_time(&s);
            }
            if let Some(e) = end {
                draft.end_time = input_time(&e);
            }
            if let Some(d) = days {
                draft.selected_days = input_days(&d);
            }
            if simple {
                draft.use_advanced_settings = false;
            }
            for warning in draft_warnings(&draft, window_given) {
                eprintln!("warning: {warning}");
            }
            let saved = svc.save(&draft).await?;
            println!("Saved.");
            print!("{}", render_settings(&saved, &svc.day_rules().await?));
        }
        SettingsCommand::Day { day, start, end, off } => {
            let day = parse_weekday(&day)?;
            let rule = DayRule::new(day, input_time(&start), input_time(&end)).with_enabled(!off);
            svc.save_day_rule(rule).await?;
            println!("Saved rule for {} (advanced mode on).", weekday_name(day).unwrap_or("?"));
            print!("{}", render_rules(&svc.day_rules().await?));
        }
        SettingsCommand::Advanced { mode } => {
            let saved = svc.set_advanced(mode == Switch::On).await?;
            let label = if saved.use_advanced_settings { "advanced" } else { "simple" };
            println!("Mode: {label}");
        }
        SettingsCommand::Days => {
            print!("{}", render_rules(&svc.day_rules().await?));
        }
    }
    Ok(())
}

/// Parts of a `settings set` that the save will drop or that leave reminders silent.
pub fn draft_warnings(draft: &SettingsDraft, window_given: bool) -> Vec<String> {
    let mut out = Vec::new();
    if window_given && !draft.enabled {
        out.push("reminders are disabled; --start/--end/--days are not kept".to_string());
    } else if window_given && draft.use_advanced_settings {
        out.push("advanced mode is on; --start/--end/--days are ignored (add --simple to use them)".to_string());
    }
    let has_day = draft.selected_days.iter().any(|d| (1..=7).contains(d));
    if draft.enabled && !draft.use_advanced_settings && !has_day {
        out.push("no weekdays selected; reminders will not fire until --days is set".to_string());
    }
    out
}

/// Normalize a user-typed time; malformed input becomes 09:00 with a warning.
pub fn input_time(raw: &str) -> String {
    if parse_hhmm(raw).is_err() {
        eprintln!("warning: '{raw}' is not HH:mm, using 09:00");
    }
    format_hhmm(parse_hhmm_or_default(raw))
}

/// Weekday list from numbers or names; unknown tokens are dropped with a warning.
pub fn input_days(raw: &str) -> Vec<u8> {
    let mut days: Vec<u8> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| match parse_weekday(t) {
            Ok(d) => Some(d),
            Err(_) => {
                eprintln!("warning: ignoring unknown weekday '{t}'");
                None
            }
        })
        .collect();
    days.sort_unstable();
    days.dedup();
    days
}

pub fn render_settings(s: &NotificationSettings, rules: &[DayRule]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Enabled:   {}\n", if s.enabled { "yes" } else { "no" }));
    out.push_str(&format!("Frequency: {} ({})\n", s.frequency.name(), s.frequency));
    if s.use_advanced_settings {
        out.push_str("Mode:      advanced\n");
        out.push_str(&render_rules(rules));
    } else {
        out.push_str("Mode:      simple\n");
        let window = match (&s.start_time, &s.end_time) {
            (Some(a), Some(b)) => format!("{a}-{b}"),
            _ => "any time".to_string(),
        };
        out.push_str(&format!("Window:    {window}\n"));
        let days: Vec<&str> = s.weekdays().into_iter().filter_map(weekday_name).collect();
        let days = if days.is_empty() { "none".to_string() } else { days.join(", ") };
        out.push_str(&format!("Days:      {days}\n"));
    }
    out
}

pub fn render_rules(rules: &[DayRule]) -> String {
    if rules.is_empty() {
        return "  (no day rules)\n".to_string();
    }
    rules
        .iter()
        .map(|r| {
            let state = if r.enabled { "" } else { "  (off)" };
            format!("  {:<9} {}-{}{}\n", r.display_name(), r.start_time, r.end_time, state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_time_falls_back() {
        assert_eq!(input_time("7:5"), "09:00");
        assert_eq!(input_time("07:05"), "07:05");
    }

    fn draft() -> SettingsDraft {
        SettingsDraft::from_settings(&tasknotify_core::NotificationSettings::default())
    }

    #[test]
    fn window_flags_in_advanced_mode_warn() {
        let d = SettingsDraft {
            use_advanced_settings: true,
            ..draft()
        };
        let w = draft_warnings(&d, true);
        assert_eq!(w.len(), 1);
        assert!(w[0].contains("--simple"));
        assert!(draft_warnings(&d, false).is_empty());
    }

    #[test]
    fn enabling_with_no_days_warns() {
        let d = SettingsDraft {
            selected_days: vec![],
            ..draft()
        };
        assert!(draft_warnings(&d, false)[0].contains("no weekdays"));
        assert!(draft_warnings(&draft(), false).is_empty());
    }

    #[test]
    fn window_flags_while_disabled_warn() {
        let d = SettingsDraft {
            enabled: false,
            ..draft()
        };
        assert!(draft_warnings(&d, true)[0].contains("disabled"));
    }

    #[test]
    fn days_accept_numbers_and_names() {
        assert_eq!(input_days("fri, 1,mon,,9,Wednesday"), vec![1, 3, 5]);
    }

    #[test]
    fn simple_settings_render() {
        let s = NotificationSettings::default().with_simple_window(Some("07:00"), Some("16:00"), "3,4,5");
        let out = render_settings(&s, &[]);
        assert!(out.contains("Mode:      simple"));
        assert!(out.contains("Window:    07:00-16:00"));
        assert!(out.contains("Days:      Wednesday, Thursday, Friday"));
    }

    #[test]
    fn advanced_settings_render_rules() {
        let rules = vec![DayRule::new(6, "10:00", "16:00").with_enabled(false)];
        let s = NotificationSettings::default().with_day_rules(&rules).unwrap();
        let out = render_settings(&s, &rules);
        assert!(out.contains("Mode:      advanced"));
        assert!(out.contains("Saturday  10:00-16:00  (off)"));
    }
}
