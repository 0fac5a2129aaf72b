//! Time utilities: parsing work durations, minute/second conversions and
//! local clock display.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Local, TimeDelta, Utc};

/// Parse a work duration such as `8h`, `8h30m`, `7h 45m` or `480m`.
pub fn parse_work_duration(input: &str) -> AppResult<TimeDelta> {
    let s: String = input
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if s.is_empty() {
        return Err(AppError::InvalidDuration(input.to_string()));
    }

    let mut minutes: i64 = 0;
    let mut digits = String::new();
    let mut saw_unit = false;

    let invalid = || AppError::InvalidDuration(input.to_string());

    for c in s.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'h' | 'm' => {
                let value: i64 = digits.parse().map_err(|_| invalid())?;
                let value = if c == 'h' {
                    value.checked_mul(60).ok_or_else(invalid)?
                } else {
                    value
                };
                minutes = minutes.checked_add(value).ok_or_else(invalid)?;
                digits.clear();
                saw_unit = true;
            }
            _ => return Err(invalid()),
        }
    }

    // trailing number without unit = minutes, only when nothing else was given
    if !digits.is_empty() {
        if saw_unit {
            return Err(invalid());
        }
        minutes = digits.parse().map_err(|_| invalid())?;
    }

    if minutes <= 0 {
        return Err(invalid());
    }

    TimeDelta::try_minutes(minutes).ok_or_else(invalid)
}

/// Whole seconds between two instants, never negative.
pub fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}

/// Round a span of seconds to the nearest whole minute.
pub fn round_to_minutes(seconds: i64) -> i64 {
    (seconds + 30).div_euclid(60)
}

/// Local wall-clock `HH:MM` for a UTC instant.
pub fn format_time_display(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M").to_string()
}

/// Local `YYYY-MM-DD HH:MM` for a UTC instant.
pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
