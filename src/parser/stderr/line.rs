//! Per-line classification for the stderr/syslog assembler. Scans bytes
//! positionally rather than compiling a regex per line — at GB-scale log
//! volumes the cost of testing every line against several regexes adds up;
//! a handful of fixed-offset byte checks and a manual substring scan for
//! the `name[pid]:` process tag are both cheaper and keep allocation to a
//! minimum.
//!
//! A line's head is tried against six shapes in priority order: plain
//! stderr, AWS RDS composite, Azure composite, RFC5424 syslog, ISO-offset
//! syslog, and BSD syslog. The first three share the same leading
//! `YYYY-MM-DD HH:MM:SS` timestamp; what follows the timezone abbreviation
//! tells them apart (`:host(port):user@db:...` for RDS, `-session-` for
//! Azure, anything else for plain stderr).

use crate::timestamp::{
    parse_bsd_syslog, parse_iso_syslog_offset, parse_postgres_prefix, parse_rfc5424_timestamp,
};
use chrono::{DateTime, Utc};

const SEVERITY_MARKERS: &[&str] = &[
    "LOG:", "ERROR:", "WARNING:", "NOTICE:", "FATAL:", "PANIC:", "INFO:", "HINT:", "DETAIL:",
    "STATEMENT:", "CONTEXT:", "DEBUG1:", "DEBUG2:", "DEBUG3:", "DEBUG4:", "DEBUG5:",
];

/// Finds a `name[digits]:` process tag anywhere in `line` (e.g.
/// `postgres[4242]:`), returning the pid and the byte offset just past the
/// trailing colon.
pub fn find_process_tag(line: &str) -> Option<(&str, usize)> {
    let bytes = line.as_bytes();
    let open = line.find('[')?;
    let close = bytes[open..].iter().position(|&b| b == b']')? + open;
    let pid = &line[open + 1..close];
    if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if bytes.get(close + 1) != Some(&b':') {
        return None;
    }
    Some((pid, close + 2))
}

/// True if `text` begins (after trimming leading whitespace) with one of
/// the PostgreSQL severity markers. Used to tell a genuinely new syslog
/// record apart from a continuation line that merely repeats the same
/// `name[pid]:` tag.
pub fn starts_with_severity(text: &str) -> bool {
    let trimmed = text.trim_start();
    SEVERITY_MARKERS.iter().any(|m| trimmed.starts_with(m))
}

/// Finds the byte offset where a severity marker begins in `text`, if any.
/// This is the boundary the prefix inferencer uses to split a raw,
/// already-timestamped stderr line into its `log_line_prefix` portion and
/// its message.
pub fn find_severity_marker(text: &str) -> Option<usize> {
    SEVERITY_MARKERS.iter().filter_map(|m| text.find(m)).min()
}

/// A line classified as the head of a new logical record.
pub enum Head<'a> {
    /// `YYYY-MM-DD HH:MM:SS[.fff] TZ ...` and its RDS/Azure composite
    /// variants, which fold down to the same shape once the host/user/db
    /// (RDS) or session id (Azure) has been pulled out or dropped.
    Plain { timestamp: DateTime<Utc>, rest: String },
    /// A syslog transport carrying a process/procid that identifies which
    /// in-progress record a continuation line belongs to: BSD (`name[pid]:`
    /// tag), RFC5424 (PROCID field), or ISO-offset (`proc[pid]:` tag).
    Syslog {
        timestamp: DateTime<Utc>,
        pid: &'a str,
        rest: &'a str,
    },
}

struct RdsTail<'a> {
    host: &'a str,
    user: &'a str,
    database: &'a str,
    rest: &'a str,
}

/// Parses the RDS composite tail `:host(port):user@db:[pid]:severity: msg`
/// that immediately follows the stderr timestamp's timezone abbreviation.
fn parse_rds_tail(tail: &str) -> Option<RdsTail<'_>> {
    let rest = tail.strip_prefix(':')?;
    let paren_open = rest.find('(')?;
    let host = &rest[..paren_open];
    let rest = &rest[paren_open + 1..];
    let paren_close = rest.find(')')?;
    let rest = rest[paren_close + 1..].strip_prefix(':')?;
    let at_idx = rest.find('@')?;
    let user = &rest[..at_idx];
    let rest = &rest[at_idx + 1..];
    let colon_idx = rest.find(':')?;
    let database = &rest[..colon_idx];
    let rest = rest[colon_idx + 1..].strip_prefix('[')?;
    let bracket_close = rest.find(']')?;
    let rest = rest[bracket_close + 1..].strip_prefix(':')?.trim_start();
    if host.is_empty() || user.is_empty() || database.is_empty() {
        return None;
    }
    Some(RdsTail { host, user, database, rest })
}

/// Parses the Azure composite tail `-session-severity: msg`, dropping the
/// session id (Azure doesn't expose it as PID/session metadata we track).
fn parse_azure_tail(after_dash: &str) -> Option<&str> {
    let dash_idx = after_dash.find('-')?;
    let session = &after_dash[..dash_idx];
    if session.is_empty() || !session.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(after_dash[dash_idx + 1..].trim_start())
}

/// RFC5424 head: `<PRI>VERSION TIMESTAMP HOSTNAME APP-NAME PROCID MSGID
/// [SD] MSG`. Structured data, if present, is skipped rather than parsed
/// into fields — nothing downstream needs it.
fn parse_rfc5424_head(line: &str) -> Option<(DateTime<Utc>, &str, &str)> {
    let rest = line.strip_prefix('<')?;
    let close = rest.find('>')?;
    let pri = &rest[..close];
    if pri.is_empty() || !pri.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let rest = &rest[close + 1..];

    let mut fields = rest.splitn(6, ' ');
    let _version = fields.next()?;
    let timestamp_str = fields.next()?;
    let _hostname = fields.next()?;
    let _app_name = fields.next()?;
    let procid = fields.next()?;
    let mut remainder = fields.next()?;

    let timestamp = parse_rfc5424_timestamp(timestamp_str)?;

    // Skip MSGID.
    remainder = match remainder.find(' ') {
        Some(sp) => &remainder[sp + 1..],
        None => "",
    };
    // Skip structured data: "-" (none) or one or more "[...]" groups.
    if let Some(stripped) = remainder.strip_prefix('-') {
        remainder = stripped.trim_start();
    } else {
        while let Some(stripped) = remainder.strip_prefix('[') {
            let Some(end) = stripped.find(']') else { break };
            remainder = stripped[end + 1..].trim_start();
        }
    }

    Some((timestamp, procid, remainder))
}

/// ISO-offset syslog head: `YYYY-MM-DDTHH:MM:SS±HH:MM host proc[pid]: ...`.
fn parse_iso_offset_head(line: &str) -> Option<(DateTime<Utc>, &str, &str)> {
    const TIMESTAMP_LEN: usize = 25; // "2025-01-02T10:00:00+00:00"
    if line.len() < TIMESTAMP_LEN {
        return None;
    }
    let timestamp = parse_iso_syslog_offset(&line[..TIMESTAMP_LEN])?;
    let rest = line[TIMESTAMP_LEN..].trim_start();
    let (pid, after_tag) = find_process_tag(rest)?;
    Some((timestamp, pid, rest[after_tag..].trim_start()))
}

/// Classifies one physical line. Returns `None` for a continuation line
/// (a line that does not open a new logical record).
pub fn classify(line: &str, now: DateTime<Utc>) -> Option<Head<'_>> {
    if let Some((timestamp, rest)) = parse_postgres_prefix(line) {
        let tail = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());

        if tail.starts_with(':') {
            if let Some(fields) = parse_rds_tail(tail) {
                return Some(Head::Plain {
                    timestamp,
                    rest: format!(
                        "db={} user={} host={} {}",
                        fields.database, fields.user, fields.host, fields.rest
                    ),
                });
            }
        } else if let Some(after_dash) = tail.strip_prefix('-') {
            if let Some(azure_rest) = parse_azure_tail(after_dash) {
                return Some(Head::Plain {
                    timestamp,
                    rest: azure_rest.to_string(),
                });
            }
        }

        return Some(Head::Plain { timestamp, rest: rest.to_string() });
    }

    if let Some((timestamp, pid, rest)) = parse_rfc5424_head(line) {
        return Some(Head::Syslog { timestamp, pid, rest });
    }

    if let Some((timestamp, pid, rest)) = parse_iso_offset_head(line) {
        return Some(Head::Syslog { timestamp, pid, rest });
    }

    if let Some((pid, after_tag)) = find_process_tag(line) {
        if starts_with_severity(&line[after_tag..]) {
            if let Some(timestamp) = parse_bsd_syslog(line, now) {
                return Some(Head::Syslog {
                    timestamp,
                    pid,
                    rest: line[after_tag..].trim_start(),
                });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn finds_process_tag() {
        let (pid, after) = find_process_tag("postgres[4242]: LOG:  hi").unwrap();
        assert_eq!(pid, "4242");
        assert_eq!(&"postgres[4242]: LOG:  hi"[after..], " LOG:  hi");
    }

    #[test]
    fn classifies_plain_head() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let head = classify("2025-01-02 10:00:00.000 UTC [42]: LOG:  hi", now).unwrap();
        assert!(matches!(head, Head::Plain { .. }));
    }

    #[test]
    fn classifies_syslog_head_with_pid() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let head = classify("Jan  2 10:00:00 dbhost postgres[4242]: LOG:  hi", now).unwrap();
        match head {
            Head::Syslog { pid, rest, .. } => {
                assert_eq!(pid, "4242");
                assert_eq!(rest, "LOG:  hi");
            }
            _ => panic!("expected syslog head"),
        }
    }

    #[test]
    fn classifies_rds_composite_head_and_prepends_metadata() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let line = "2025-01-02 10:00:00 UTC:10.0.0.5(5432):alice@shop:[4242]:LOG:  connection received";
        let head = classify(line, now).unwrap();
        match head {
            Head::Plain { rest, .. } => {
                assert_eq!(rest, "db=shop user=alice host=10.0.0.5 LOG:  connection received");
            }
            _ => panic!("expected plain head"),
        }
    }

    #[test]
    fn classifies_azure_composite_head_and_drops_session_id() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let line = "2025-01-02 10:00:00 UTC-12345-LOG:  connection received";
        let head = classify(line, now).unwrap();
        match head {
            Head::Plain { rest, .. } => {
                assert_eq!(rest, "LOG:  connection received");
            }
            _ => panic!("expected plain head"),
        }
    }

    #[test]
    fn classifies_rfc5424_head() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let line = "<34>1 2025-01-02T10:00:00.000Z dbhost postgres 4242 - - LOG:  connection received";
        let head = classify(line, now).unwrap();
        match head {
            Head::Syslog { pid, rest, .. } => {
                assert_eq!(pid, "4242");
                assert_eq!(rest, "LOG:  connection received");
            }
            _ => panic!("expected syslog head"),
        }
    }

    #[test]
    fn classifies_iso_offset_syslog_head() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let line = "2025-01-02T10:00:00+00:00 dbhost postgres[4242]: LOG:  connection received";
        let head = classify(line, now).unwrap();
        match head {
            Head::Syslog { pid, rest, .. } => {
                assert_eq!(pid, "4242");
                assert_eq!(rest, "LOG:  connection received");
            }
            _ => panic!("expected syslog head"),
        }
    }

    #[test]
    fn finds_severity_marker_offset() {
        let text = "[42]: user=alice,db=shop LOG:  connected";
        let idx = find_severity_marker(text).unwrap();
        assert_eq!(&text[idx..], "LOG:  connected");
    }

    #[test]
    fn continuation_line_is_not_a_head() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert!(classify("\tdetail line without a timestamp", now).is_none());
        assert!(classify("Jan  2 10:00:05 dbhost postgres[4242]: \tcontinued", now).is_none());
    }
}
