//! Calendar helpers for the app-specific week.
//!
//! The app week starts on Saturday regardless of the host locale, so day
//! indices run Saturday = 0 through Friday = 6. All functions operate on
//! local wall-clock values (`NaiveDate` / `NaiveDateTime`); the caller reads
//! the clock once per activation and passes it down.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of whole days after which a period is considered closed.
pub const DAYS_PER_WEEK: i64 = 7;

/// Day of the app week, ordered from the week start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayOfWeek {
    Saturday,
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl DayOfWeek {
    /// All days in app-week order.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
    ];

    /// Position within the app week (Saturday = 0).
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// The app day a calendar date falls on.
    pub fn of(date: NaiveDate) -> Self {
        Self::ALL[app_day_index(date) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    /// Accepts full names, three-letter abbreviations, or the app index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let day = match lower.as_str() {
            "0" | "sat" | "saturday" => DayOfWeek::Saturday,
            "1" | "sun" | "sunday" => DayOfWeek::Sunday,
            "2" | "mon" | "monday" => DayOfWeek::Monday,
            "3" | "tue" | "tuesday" => DayOfWeek::Tuesday,
            "4" | "wed" | "wednesday" => DayOfWeek::Wednesday,
            "5" | "thu" | "thursday" => DayOfWeek::Thursday,
            "6" | "fri" | "friday" => DayOfWeek::Friday,
            _ => {
                return Err(format!(
                    "Invalid day: '{s}'. Use 0-6 or sat/sun/mon/tue/wed/thu/fri"
                ))
            }
        };
        Ok(day)
    }
}

/// App day index of a date: 0 = Saturday ... 6 = Friday.
pub fn app_day_index(date: NaiveDate) -> u32 {
    (date.weekday().num_days_from_sunday() + 1) % 7
}

/// Canonical start of the app week containing `date` (the most recent Saturday).
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date.checked_sub_signed(Duration::days(i64::from(app_day_index(date))))
        .unwrap_or(date)
}

pub fn yesterday(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Month identifier in `YYYY-MM` form.
pub fn month_id(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// 1-based week number of a date within its month (`ceil(day / 7)`).
pub fn week_index_in_month(date: NaiveDate) -> u32 {
    date.day().div_ceil(7)
}

/// Milliseconds on the local timeline, used for regeneration checkpoints.
pub fn epoch_millis(now: NaiveDateTime) -> i64 {
    now.and_utc().timestamp_millis()
}

/// Deserialize an optional `YYYY-MM-DD` date, mapping empty or malformed
/// strings to `None` instead of failing the whole record.
pub fn deserialize_lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

/// Deserialize an optional timestamp written either as RFC 3339 (converted
/// to its UTC wall clock) or as a naive `YYYY-MM-DDTHH:MM:SS`.
pub fn deserialize_lenient_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let s = s.trim();
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }))
}
