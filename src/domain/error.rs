use thiserror::Error;

/// Source-level error: fatal for that source. No entries are emitted.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source is empty")]
    Empty,

    #[error("source looks like binary content")]
    Binary,

    #[error("content does not match the `{extension}` extension")]
    InvalidFormatForExtension { extension: String },

    #[error("could not detect a supported log format")]
    UnknownFormat,

    #[error("compression stream could not be read: {0}")]
    CompressionFailed(String),

    #[error("failed to open or stat source: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-record conditions that are recoverable: logged, never returned.
/// Kept as a type (rather than ad hoc strings) so every call site that
/// decides to skip a record documents *why* in a way tests can assert on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordWarning {
    #[error("CSV record has too few fields ({found} < {min_required})")]
    CsvTooFewFields { found: usize, min_required: usize },

    #[error("CSV record timestamp could not be parsed: {raw}")]
    CsvUnparseableTimestamp { raw: String },

    #[error("JSON record is malformed: {details}")]
    JsonMalformed { details: String },

    #[error("JSON record has no recognizable timestamp field")]
    JsonMissingTimestamp,

    #[error("orphan syslog continuation for pid {pid} (no prior entry)")]
    OrphanSyslogContinuation { pid: String },

    #[error("tar entry '{name}' has an unsupported extension, skipped")]
    UnsupportedTarEntry { name: String },
}
