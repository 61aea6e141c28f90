//! Parse errors for user-facing schedule values.

/// A value read from storage or user input could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid time '{0}' (expected HH:mm)")]
    Time(String),

    #[error("invalid weekday '{0}' (expected 1-7 or a day name)")]
    Weekday(String),

    #[error("invalid day rules: {0}")]
    DayRules(String),

    #[error("unknown frequency '{0}'")]
    Frequency(String),

    #[error("unknown priority '{0}'")]
    Priority(String),

    #[error("invalid timezone: {0}")]
    Timezone(String),
}
