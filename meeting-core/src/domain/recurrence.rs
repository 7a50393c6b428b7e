use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recurrence cadence ("Recurrence").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
}

/// Bitmask of weekdays, Monday = bit 0 through Sunday = bit 6, used by
/// weekly recurrences ("Weekly uses a bitmask of weekdays").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyDays(pub u8);

impl WeeklyDays {
    pub fn contains(self, weekday: chrono::Weekday) -> bool {
        let bit = weekday.num_days_from_monday();
        self.0 & (1 << bit) != 0
    }

    pub fn single(weekday: chrono::Weekday) -> Self {
        WeeklyDays(1 << weekday.num_days_from_monday())
    }
}

/// Monthly recurrence anchor: either a fixed day-of-month, or an ordinal
/// weekday (e.g. "the 2nd Tuesday") ("monthly may specify
/// day-of-month OR (ordinal-week, weekday)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonthlyRule {
    DayOfMonth { monthly_day: u8 },
    OrdinalWeekday { monthly_week: i8, weekday: chrono::Weekday },
}

/// How a recurrence terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndCondition {
    EndDateTime(DateTime<Utc>),
    EndTimesCount(u32),
    None,
}

/// A recurrence rule attached to a [`crate::domain::Meeting`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recurrence {
    #[serde(rename = "type")]
    pub recurrence_type: RecurrenceType,
    pub repeat_interval: u32,
    pub weekly_days: Option<WeeklyDays>,
    pub monthly_rule: Option<MonthlyRule>,
    pub end_condition: EndCondition,
}

impl Recurrence {
    /// `repeat_interval` is clamped to >= 1 ("repeat_interval >= 1").
    pub fn interval(&self) -> u32 {
        self.repeat_interval.max(1)
    }
}
