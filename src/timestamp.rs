//! ISO-8601 timestamp normalization to epoch milliseconds.
//!
//! Accepts the mixed-precision strings tick files tend to carry:
//! `T` or space separated, 0-9+ fractional digits, optional `Z` / `±HH:MM` /
//! `±HHMM` / `±HH` offsets, plus date-only and minute-precision forms.
//! Naive values are read as UTC.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::error::TimestampError;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// Parse `raw` and return epoch milliseconds, truncating anything below a
/// millisecond toward negative infinity.
pub fn normalize_timestamp(raw: &str) -> Result<i64, TimestampError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TimestampError::Empty);
    }

    let (local, offset_secs) = split_offset(raw)?;
    let naive = parse_naive(local).ok_or_else(|| TimestampError::Invalid(raw.to_string()))?;
    let utc = naive
        .checked_sub_signed(TimeDelta::seconds(offset_secs))
        .ok_or_else(|| TimestampError::OutOfRange(raw.to_string()))?;

    let nanos = utc
        .and_utc()
        .timestamp_nanos_opt()
        .ok_or_else(|| TimestampError::OutOfRange(raw.to_string()))?;
    Ok(nanos.div_euclid(NANOS_PER_MILLI))
}

/// Split a trailing UTC offset off `raw`. Offsets can only start after the
/// date part, so a `-` inside `YYYY-MM-DD` never matches.
fn split_offset(raw: &str) -> Result<(&str, i64), TimestampError> {
    if let Some(local) = raw.strip_suffix(['Z', 'z']) {
        return Ok((local, 0));
    }
    let Some(time_part) = raw.get(10..) else {
        return Ok((raw, 0));
    };

    let Some(pos) = time_part.rfind(['+', '-']).map(|p| p + 10) else {
        return Ok((raw, 0));
    };
    let (local, offset) = raw.split_at(pos);
    Ok((local, parse_offset(offset)?))
}

fn parse_offset(offset: &str) -> Result<i64, TimestampError> {
    let err = || TimestampError::Offset(offset.to_string());
    let (sign, body) = match offset.as_bytes().first() {
        Some(b'+') => (1, &offset[1..]),
        Some(b'-') => (-1, &offset[1..]),
        _ => return Err(err()),
    };
    let digits: String = body.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }
    let (hours, minutes) = match digits.len() {
        2 => (&digits[..2], "0"),
        4 => (&digits[..2], &digits[2..]),
        _ => return Err(err()),
    };
    let hours: i64 = hours.parse().map_err(|_| err())?;
    let minutes: i64 = minutes.parse().map_err(|_| err())?;
    if hours > 23 || minutes > 59 {
        return Err(err());
    }
    Ok(sign * (hours * 3600 + minutes * 60))
}

fn parse_naive(local: &str) -> Option<NaiveDateTime> {
    if local.len() == 10 {
        return NaiveDate::parse_from_str(local, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0);
    }

    // Accept a space (or lowercase t) between date and time.
    let mut normalized = local.to_string();
    match normalized.as_bytes().get(10) {
        Some(b'T') => {}
        Some(b' ') | Some(b't') => normalized.replace_range(10..11, "T"),
        _ => return None,
    }

    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M"))
        .ok()
        // chrono reads `:60` as a leap second; tick files never carry one.
        .filter(|t| t.nanosecond() < 1_000_000_000)
}
