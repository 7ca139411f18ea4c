use chrono::{DateTime, Duration, NaiveDate, Utc};
use crate::errors::DigfootError;
use crate::models::TimeWindow;
use crate::utils::text::{from_date, from_rfc3339};

/// Which end of the window a bound closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Since,
    /// A bare date here covers the whole day.
    Until,
}

/// Parse a time bound: RFC 3339, `YYYY-MM-DD`, or a relative age
/// (`90m`, `12h`, `30d`, `2w`) measured back from `now`.
pub fn parse_time_bound(
    value: &str,
    side: BoundSide,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, DigfootError> {
    let value = value.trim();
    if let Some(ts) = from_rfc3339(value) {
        return Ok(ts);
    }
    if let Some(start) = from_date(value) {
        return Ok(match side {
            BoundSide::Since => start,
            BoundSide::Until => end_of_day(value).unwrap_or(start),
        });
    }

    let invalid = || DigfootError::Config(format!(
        "Invalid time bound '{}': expected RFC 3339, YYYY-MM-DD or an age like 30d",
        value
    ));

    let (unit_at, _) = value.char_indices().last().ok_or_else(invalid)?;
    let (amount, unit) = value.split_at(unit_at);
    if !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    let age = match unit {
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        "w" => Duration::try_weeks(amount),
        _ => None,
    }
    .ok_or_else(invalid)?;

    now.checked_sub_signed(age).ok_or_else(invalid)
}

fn end_of_day(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()?
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|dt| dt.and_utc())
}

pub fn parse_window(
    since: Option<&str>,
    until: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TimeWindow, DigfootError> {
    let since = since.map(|s| parse_time_bound(s, BoundSide::Since, now)).transpose()?;
    let until = until.map(|u| parse_time_bound(u, BoundSide::Until, now)).transpose()?;

    if let (Some(s), Some(u)) = (since, until) {
        if s > u {
            return Err(DigfootError::Config(format!(
                "Time window is empty: since {} is after until {}",
                s.to_rfc3339(),
                u.to_rfc3339()
            )));
        }
    }

    Ok(TimeWindow { since, until })
}
