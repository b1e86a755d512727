//! PostgreSQL CSV log parser. PostgreSQL's `csvlog` destination has grown
//! columns across major versions (13 added `backend_type`, 14 added
//! `leader_pid` and `query_id`); we read positionally and tolerate short
//! rows rather than pinning to one schema version.

use crate::domain::{ExtractedMetadata, LogEntry, RecordWarning};
use crate::timestamp::parse_csv_log_time;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;

// 0-based column indices for the fields we care about. PostgreSQL's own
// documentation lists the full 23-26 column layout; we only need these.
const COL_LOG_TIME: usize = 0;
const COL_USER_NAME: usize = 1;
const COL_DATABASE_NAME: usize = 2;
const COL_ERROR_SEVERITY: usize = 11;
const COL_MESSAGE: usize = 13;
const COL_DETAIL: usize = 14;
const COL_HINT: usize = 15;
const COL_CONTEXT: usize = 18;
const COL_QUERY: usize = 19;
const COL_APPLICATION_NAME: usize = 22;

/// Below this column count a row can't carry `message`, which is the
/// field we can't do without.
const MIN_REQUIRED_FIELDS: usize = COL_MESSAGE + 1;

pub struct CsvParseOutcome {
    pub entries: Vec<(LogEntry, ExtractedMetadata)>,
    pub warnings: Vec<RecordWarning>,
}

/// Parses a full CSV log stream. PostgreSQL's csvlog writer never splits a
/// logical record across physical lines outside of a quoted field, so the
/// `csv` crate's own RFC4180-ish quoting handles multi-line messages for
/// us; there is no separate continuation-assembly step like the stderr
/// format needs.
pub fn parse<R: Read>(reader: R) -> std::io::Result<CsvParseOutcome> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    for result in rdr.records() {
        let record = result?;
        match parse_record(&record) {
            Ok(pair) => entries.push(pair),
            Err(warning) => warnings.push(warning),
        }
    }

    Ok(CsvParseOutcome { entries, warnings })
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn parse_record(record: &StringRecord) -> Result<(LogEntry, ExtractedMetadata), RecordWarning> {
    if record.len() < MIN_REQUIRED_FIELDS {
        return Err(RecordWarning::CsvTooFewFields {
            found: record.len(),
            min_required: MIN_REQUIRED_FIELDS,
        });
    }

    let raw_time = field(record, COL_LOG_TIME);
    let timestamp = parse_csv_log_time(raw_time).ok_or_else(|| RecordWarning::CsvUnparseableTimestamp {
        raw: raw_time.to_string(),
    })?;

    let severity = field(record, COL_ERROR_SEVERITY);
    let message_body = field(record, COL_MESSAGE);
    let mut message = if severity.is_empty() {
        message_body.to_string()
    } else {
        format!("{severity}: {message_body}")
    };
    append_part(&mut message, "DETAIL", field(record, COL_DETAIL));
    append_part(&mut message, "HINT", field(record, COL_HINT));
    append_part(&mut message, "QUERY", field(record, COL_QUERY));
    append_part(&mut message, "CONTEXT", field(record, COL_CONTEXT));

    let metadata = ExtractedMetadata {
        user: non_empty(field(record, COL_USER_NAME)),
        database: non_empty(field(record, COL_DATABASE_NAME)),
        application: non_empty(field(record, COL_APPLICATION_NAME)),
        host: None,
        prefix: None,
        message: message.clone(),
    };

    Ok((LogEntry::new(timestamp, message), metadata))
}

fn append_part(message: &mut String, label: &str, value: &str) {
    if !value.is_empty() {
        message.push_str(&format!(" {label}: {value}"));
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
