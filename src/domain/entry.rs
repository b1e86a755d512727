use chrono::{DateTime, Utc};

/// The universal record produced by every parser and consumed by the sink.
///
/// Value type: created once by a parser, emitted exactly once. `timestamp`
/// is the Unix epoch when a line's timestamp could not be parsed — this is
/// a valid, non-error state (spec: "a decoded entry whose timestamp string
/// failed to parse still propagates").
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
        }
    }

    /// An entry whose source line carried no parseable timestamp.
    pub fn with_unknown_timestamp(message: impl Into<String>) -> Self {
        Self {
            timestamp: zero_timestamp(),
            message: message.into(),
        }
    }

    pub fn has_known_timestamp(&self) -> bool {
        self.timestamp != zero_timestamp()
    }
}

/// The sentinel "timestamp could not be parsed" instant.
pub fn zero_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(0, 0).expect("unix epoch is always representable")
}

/// A bounded prefix of the input used only for format detection and prefix
/// learning. Never larger than `MAX_SAMPLE_BYTES`, and truncated to end at a
/// newline whenever one is present in range.
#[derive(Debug, Clone)]
pub struct Sample {
    bytes: Vec<u8>,
}

pub const MAX_SAMPLE_BYTES: usize = 32 * 1024;

impl Sample {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::str::from_utf8(&self.bytes)
            .unwrap_or("")
            .lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timestamp_is_distinguishable() {
        let known = LogEntry::new(Utc::now(), "LOG: ok");
        let unknown = LogEntry::with_unknown_timestamp("LOG: ok");
        assert!(known.has_known_timestamp());
        assert!(!unknown.has_known_timestamp());
    }

    #[test]
    fn sample_lines_split_on_newline() {
        let sample = Sample::new(b"a\nb\nc".to_vec());
        let lines: Vec<&str> = sample.lines().collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }
}
