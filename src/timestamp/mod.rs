//! Timestamp decoders for every wire shape this crate ingests.
//!
//! These are free functions, not a trait: the stderr parser tries several
//! of them positionally against one line and must not pay for dynamic
//! dispatch or a trait object per attempt. Timezone abbreviations (`UTC`,
//! `PST`, …) are not resolved to an offset: this crate does not resolve
//! timezones beyond what the timestamp string encodes, and PostgreSQL
//! almost always logs in UTC or the server's local time rendered as
//! UTC-equivalent digits, so we take the digits at face value.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// `2025-01-02 10:00:00.123 UTC` / `2025-01-02 10:00:00 UTC` (stderr/CSV/RDS/Azure shape).
pub fn parse_postgres_naive(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    None
}

/// Parses the leading `YYYY-MM-DD HH:MM:SS[.frac]` of `text`, ignoring and
/// returning the trailing remainder (typically a timezone abbreviation and
/// then the rest of the line).
pub fn parse_postgres_prefix(text: &str) -> Option<(DateTime<Utc>, &str)> {
    // Fixed-width positional check: "YYYY-MM-DD HH:MM:SS" is exactly 19 bytes.
    if text.len() < 19 {
        return None;
    }
    let bytes = text.as_bytes();
    let is_digit = |i: usize| bytes.get(i).is_some_and(u8::is_ascii_digit);
    let is_char = |i: usize, c: u8| bytes.get(i) == Some(&c);
    for i in [0, 1, 2, 3, 5, 6, 8, 9, 11, 12, 14, 15, 17, 18] {
        if !is_digit(i) {
            return None;
        }
    }
    if !is_char(4, b'-') || !is_char(7, b'-') || !is_char(10, b' ') {
        return None;
    }
    if !is_char(13, b':') || !is_char(16, b':') {
        return None;
    }

    let mut end = 19;
    if bytes.get(19) == Some(&b'.') {
        end = 20;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }

    let naive = NaiveDateTime::parse_from_str(&text[..19], "%Y-%m-%d %H:%M:%S").ok()?;
    let naive = if end > 19 {
        let frac = &text[19..end];
        NaiveDateTime::parse_from_str(
            &format!("{}{}", &text[..19], frac),
            "%Y-%m-%d %H:%M:%S%.f",
        )
        .unwrap_or(naive)
    } else {
        naive
    };

    Some((Utc.from_utc_datetime(&naive), text[end..].trim_start()))
}

/// RFC3339 / RFC3339 with nanoseconds.
pub fn parse_rfc3339(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// BSD syslog: `Mon D HH:MM:SS`. No year in the format; infer from `now`,
/// rolling back a year if the parsed month is after the current month.
pub fn parse_bsd_syslog(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    // "Jan  2 10:00:00" (note the double space for single-digit days) or
    // "Jan 12 10:00:00".
    if text.len() < 15 {
        return None;
    }
    let candidate = &text[..15];
    let this_year = now.year();
    let with_year = format!("{this_year} {candidate}");
    let naive = NaiveDateTime::parse_from_str(&with_year, "%Y %b %e %H:%M:%S").ok()?;
    let year = if naive.month() as i32 > now.month() as i32 {
        this_year - 1
    } else {
        this_year
    };
    let with_year = format!("{year} {candidate}");
    let naive = NaiveDateTime::parse_from_str(&with_year, "%Y %b %e %H:%M:%S").ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// ISO syslog with an explicit offset: `YYYY-MM-DDTHH:MM:SS±HH:MM`.
pub fn parse_iso_syslog_offset(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%:z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// RFC5424 syslog header timestamp: `YYYY-MM-DDTHH:MM:SS.ffffff+HH:MM` or `Z`.
pub fn parse_rfc5424_timestamp(text: &str) -> Option<DateTime<Utc>> {
    parse_rfc3339(text).or_else(|| parse_iso_syslog_offset(text))
}

/// Numbers are seconds below this threshold, milliseconds at or above it:
/// numbers ≤10^12 are Unix seconds, greater are Unix milliseconds.
const EPOCH_MS_THRESHOLD: i64 = 1_000_000_000_000;

pub fn parse_epoch_number(n: i64) -> Option<DateTime<Utc>> {
    if n.unsigned_abs() <= EPOCH_MS_THRESHOLD as u64 {
        DateTime::from_timestamp(n, 0)
    } else {
        DateTime::from_timestamp_millis(n)
    }
}

/// Six format attempts for the PostgreSQL CSV `log_time` column:
/// with/without microseconds, with/without timezone.
pub fn parse_csv_log_time(text: &str) -> Option<DateTime<Utc>> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f %Z",
        "%Y-%m-%d %H:%M:%S %Z",
        "%Y-%m-%d %H:%M:%S%.f%#z",
        "%Y-%m-%d %H:%M:%S%#z",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in FORMATS {
        if fmt.contains("%Z") {
            // chrono's NaiveDateTime parser rejects a trailing alphabetic
            // abbreviation under `%Z` as a pure-naive format; strip it
            // ourselves and treat the clock digits as UTC, since we never
            // resolve a timezone abbreviation to an offset anyway.
            if let Some((head, _tz)) = text.rsplit_once(' ') {
                let naive_fmt = fmt.replace(" %Z", "");
                if let Ok(naive) = NaiveDateTime::parse_from_str(head, &naive_fmt) {
                    return Some(Utc.from_utc_datetime(&naive));
                }
            }
        } else if fmt.contains("%#z") {
            if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        } else if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// The four PostgreSQL-ish JSON timestamp string shapes, tried after
/// RFC3339/RFC3339Nano.
pub fn parse_json_timestamp_string(text: &str) -> Option<DateTime<Utc>> {
    if let Some(dt) = parse_rfc3339(text) {
        return Some(dt);
    }
    if let Some((dt, _)) = parse_postgres_prefix(text) {
        return Some(dt);
    }
    parse_csv_log_time(text)
}

/// A date-only sanity check used by `is_log`/`is_csv` style validators:
/// true if `y-m-d` parses as a real calendar date.
pub fn is_plausible_date(year: i32, month: u32, day: u32) -> bool {
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}
