//! Content-based format validators used when extension-based detection is
//! absent or inconclusive.

use crate::detect::generated::{pattern_index, VALIDATED_PATTERNS};

/// Field names that mark a JSON object as carrying a log timestamp.
const JSON_TIMESTAMP_FIELDS: &[&str] = &["timestamp", "time", "ts", "@timestamp", "insertId", "textPayload"];

/// A sample "looks binary" if it contains a NUL byte, is not valid UTF-8,
/// or more than 30% of its characters are ASCII control characters other
/// than `\n`, `\r`, `\t` — PostgreSQL's own log formats are always text
/// dominated by printable characters. Callers hand us an already-bounded
/// detection sample (at most `MAX_SAMPLE_BYTES`), so no further truncation
/// happens here.
pub fn is_binary(sample: &[u8]) -> bool {
    if sample.contains(&0) {
        return true;
    }
    let Ok(text) = std::str::from_utf8(sample) else {
        return true;
    };
    if text.is_empty() {
        return false;
    }
    let controls = text
        .chars()
        .filter(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
        .count();
    (controls as f64 / text.chars().count() as f64) > 0.3
}

/// True if the sample parses as a JSON object, as newline-delimited JSON
/// objects (the CNPG/Cloud SQL/RDS-JSON shapes all emit one object per
/// line), or as a top-level JSON array of objects (native jsonlog's array
/// form) — and at least one object in the sample carries a recognized
/// timestamp field.
pub fn is_json(sample: &[u8]) -> bool {
    let text = match std::str::from_utf8(sample) {
        Ok(t) => t,
        Err(_) => return false,
    };
    let trimmed = text.trim_start();
    if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
        return false;
    }

    if trimmed.starts_with('[') {
        return match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Array(items)) => {
                !items.is_empty() && items.iter().all(|v| v.is_object()) && items.iter().any(has_timestamp_field)
            }
            _ => false,
        };
    }

    let mut saw_line = false;
    let mut saw_timestamp_field = false;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        saw_line = true;
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value @ serde_json::Value::Object(_)) => {
                saw_timestamp_field = saw_timestamp_field || has_timestamp_field(&value);
            }
            _ => return false,
        }
    }
    saw_line && saw_timestamp_field
}

fn has_timestamp_field(value: &serde_json::Value) -> bool {
    let serde_json::Value::Object(map) = value else {
        return false;
    };
    JSON_TIMESTAMP_FIELDS.iter().any(|field| map.contains_key(*field))
}

/// True if the sample's first CSV record — read with a quote-aware reader
/// rather than naive line splitting, so a `csvlog` record with an embedded
/// newline inside a quoted field doesn't break detection — has at least
/// 12 fields and a first field matching the PostgreSQL CSV `log_time`
/// shape, and the raw sample has at least 12 commas overall.
pub fn is_csv(sample: &[u8]) -> bool {
    if count_commas(sample) < 12 {
        return false;
    }
    let re = VALIDATED_PATTERNS
        .get(pattern_index::CSV_TIMESTAMP_FIELD)
        .expect("csv_timestamp_field pattern is statically valid");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(sample);
    let Some(Ok(record)) = reader.records().next() else {
        return false;
    };
    record.len() >= 12 && record.get(0).is_some_and(|field| re.is_match(field))
}

fn count_commas(sample: &[u8]) -> usize {
    sample.iter().filter(|&&b| b == b',').count()
}

/// True if any of the stderr/syslog severity-line patterns compiled from
/// `build.rs` match at least one line of the sample.
pub fn is_log(sample: &[u8]) -> bool {
    let text = match std::str::from_utf8(sample) {
        Ok(t) => t,
        Err(_) => return false,
    };
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for i in 0..VALIDATED_PATTERNS.len() {
            if i == pattern_index::CSV_TIMESTAMP_FIELD {
                continue;
            }
            if let Ok(re) = VALIDATED_PATTERNS.get(i) {
                if re.is_match(line) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_binary_via_nul_byte() {
        assert!(is_binary(b"hello\0world"));
        assert!(!is_binary(b"hello world"));
    }

    #[test]
    fn detects_binary_via_control_character_ratio() {
        let mostly_controls: Vec<u8> = (0..100)
            .map(|i| if i % 4 == 0 { b'a' } else { 0x02 })
            .collect();
        assert!(is_binary(&mostly_controls));
        assert!(!is_binary(b"hello\tworld\r\nsecond line\n"));
    }

    #[test]
    fn detects_json_lines() {
        let sample = b"{\"time\":\"2025-01-02 10:00:00 UTC\",\"message\":\"hi\"}\n";
        assert!(is_json(sample));
        assert!(!is_json(b"not json at all\n"));
    }

    #[test]
    fn detects_json_lines_without_a_timestamp_field_are_rejected() {
        let sample = b"{\"message\":\"hi\"}\n";
        assert!(!is_json(sample));
    }

    #[test]
    fn detects_top_level_json_array_of_objects() {
        let sample = br#"[{"timestamp":"2025-01-02 10:00:00 UTC","message":"hi"},{"timestamp":"2025-01-02 10:00:01 UTC","message":"bye"}]"#;
        assert!(is_json(sample));
    }

    #[test]
    fn detects_csv_rows() {
        let sample = b"\"2025-01-02 10:00:00.123 UTC\",\"user\",\"db\",42,,,,,,,,,\"LOG\",,\"hi\"\n";
        assert!(is_csv(sample));
        assert!(!is_csv(b"2025-01-02 10:00:00 UTC [42]: LOG:  hi\n"));
    }

    #[test]
    fn detects_csv_record_with_embedded_newline_in_a_quoted_field() {
        let sample = b"\"2025-01-02 10:00:00.123 UTC\",\"user\",\"db\",42,,,,,,,,,\"LOG\",\"line one\nline two\"\n";
        assert!(is_csv(sample));
    }

    #[test]
    fn detects_stderr_log_lines() {
        let sample = b"2025-01-02 10:00:00.123 UTC [42]: LOG:  connection received\n";
        assert!(is_log(sample));
        assert!(!is_log(b"just some prose with no markers\n"));
    }

    #[test]
    fn detects_bsd_syslog_log_lines() {
        let sample = b"Jan  2 10:00:00 dbhost postgres[4242]: LOG:  hi\n";
        assert!(is_log(sample));
    }
}
