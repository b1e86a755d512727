//! JSON log parser. PostgreSQL's own `jsonlog` destination (added in PG
//! 15) is one shape among several seen in the wild: managed
//! providers wrap it differently. We normalize via `serde_json::Value`
//! rather than a fixed `#[derive(Deserialize)]` struct because the five
//! wire shapes don't share a single schema, only a handful of overlapping
//! field names.

use crate::domain::{ExtractedMetadata, LogEntry, RecordWarning};
use crate::timestamp::parse_json_timestamp_string;
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader, Read};

pub struct JsonParseOutcome {
    pub entries: Vec<(LogEntry, ExtractedMetadata)>,
    pub warnings: Vec<RecordWarning>,
}

/// Parses a JSON log stream, auto-switching between a top-level array of
/// objects and newline-delimited objects (JSONL/NDJSON) based on the first
/// non-whitespace byte.
pub fn parse<R: Read>(reader: R) -> std::io::Result<JsonParseOutcome> {
    let mut buffered = BufReader::new(reader);
    match peek_first_non_whitespace(&mut buffered)? {
        Some(b'[') => parse_array(buffered),
        _ => parse_lines(buffered),
    }
}

/// Skips leading whitespace in `reader` without consuming the first
/// non-whitespace byte, so the caller can dispatch on it and still read it
/// again as part of the real payload.
fn peek_first_non_whitespace<R: BufRead>(reader: &mut R) -> std::io::Result<Option<u8>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        let Some(&b) = buf.first() else {
            return Ok(None);
        };
        if b.is_ascii_whitespace() {
            reader.consume(1);
            continue;
        }
        return Ok(Some(b));
    }
}

fn parse_lines<R: BufRead>(buffered: R) -> std::io::Result<JsonParseOutcome> {
    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    for line in buffered.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_value(line) {
            Ok(pair) => entries.push(pair),
            Err(warning) => warnings.push(warning),
        }
    }

    Ok(JsonParseOutcome { entries, warnings })
}

/// A top-level JSON array is decoded whole rather than streamed element by
/// element: `serde_json`'s reader iterator yields concatenated top-level
/// values, not array elements, and hand-rolling brace-matching to stream
/// arbitrarily large arrays is out of scope here. Array-mode sources are
/// rare (most shippers emit NDJSON); this trades peak memory for
/// simplicity.
fn parse_array<R: Read>(reader: R) -> std::io::Result<JsonParseOutcome> {
    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    let values: Vec<Value> = match serde_json::from_reader(reader) {
        Ok(v) => v,
        Err(e) => {
            warnings.push(RecordWarning::JsonMalformed { details: e.to_string() });
            return Ok(JsonParseOutcome { entries, warnings });
        }
    };

    for value in values {
        match parse_object(&value) {
            Ok(pair) => entries.push(pair),
            Err(warning) => warnings.push(warning),
        }
    }

    Ok(JsonParseOutcome { entries, warnings })
}

fn parse_value(line: &str) -> Result<(LogEntry, ExtractedMetadata), RecordWarning> {
    let value: Value = serde_json::from_str(line).map_err(|e| RecordWarning::JsonMalformed {
        details: e.to_string(),
    })?;
    parse_object(&value)
}

fn parse_object(value: &Value) -> Result<(LogEntry, ExtractedMetadata), RecordWarning> {
    let obj = value.as_object().ok_or_else(|| RecordWarning::JsonMalformed {
        details: "top-level JSON value is not an object".to_string(),
    })?;

    // Cloud SQL's Stackdriver-style export puts an already-formatted
    // PostgreSQL line under `textPayload`; used verbatim, no reconstruction.
    if let Some(text) = get_string(obj, "textPayload") {
        let timestamp_raw =
            get_string(obj, "timestamp").ok_or(RecordWarning::JsonMissingTimestamp)?;
        let timestamp =
            parse_timestamp(&timestamp_raw).ok_or(RecordWarning::JsonMissingTimestamp)?;
        let metadata = ExtractedMetadata {
            user: None,
            database: None,
            application: None,
            host: None,
            prefix: None,
            message: text.clone(),
        };
        return Ok((LogEntry::new(timestamp, text), metadata));
    }

    let record = unwrap_cnpg(obj).unwrap_or(obj);

    let timestamp_raw = first_string(record, &["timestamp", "time", "ts", "@timestamp", "log_time"])
        .ok_or(RecordWarning::JsonMissingTimestamp)?;
    let timestamp = parse_timestamp(&timestamp_raw).ok_or(RecordWarning::JsonMissingTimestamp)?;

    let pid = first_string(record, &["pid", "process_id"]);
    let user = first_string(record, &["user", "user_name"]);
    let database = first_string(record, &["dbname", "database_name", "database"]);
    let application = first_string(record, &["application_name", "app"]);
    let host = first_string(record, &["remote_host", "connection_from", "host", "hostname"])
        .map(|h| strip_port(&h));
    let severity = first_string(record, &["error_severity", "severity"]);
    let body = first_string(record, &["message", "msg"]);
    let detail = get_string(record, "detail");
    let hint = get_string(record, "hint");
    let statement = first_string(record, &["statement", "query"]);
    let context = get_string(record, "context");
    let sql_state = first_string(record, &["state_code", "sql_state_code", "sqlstate"]);

    let message = build_message(
        pid.as_deref(),
        user.as_deref(),
        database.as_deref(),
        application.as_deref(),
        host.as_deref(),
        severity.as_deref(),
        body.as_deref(),
        detail.as_deref(),
        hint.as_deref(),
        statement.as_deref(),
        context.as_deref(),
        sql_state.as_deref(),
    );

    // The reconstructed message already carries `user=…,db=…,app=…,client=…`
    // inline; leave `ExtractedMetadata`'s fields empty so the normalizer
    // downstream doesn't prepend a second copy.
    let metadata = ExtractedMetadata {
        user: None,
        database: None,
        application: None,
        host: None,
        prefix: None,
        message: message.clone(),
    };

    Ok((LogEntry::new(timestamp, message), metadata))
}

/// CloudNative-PG's operator wraps the native PostgreSQL JSON record in a
/// zap-logger envelope: `{"logger":"postgres","record":{...}}` (or
/// `"pgaudit"`). Detect that shape specifically rather than preferring any
/// `record` field, so unrelated JSON carrying a coincidental `record` key
/// isn't misread.
fn unwrap_cnpg(obj: &Map<String, Value>) -> Option<&Map<String, Value>> {
    let logger = get_string(obj, "logger")?;
    if logger != "postgres" && logger != "pgaudit" {
        return None;
    }
    obj.get("record").and_then(Value::as_object)
}

fn strip_port(host: &str) -> String {
    if let Some(idx) = host.rfind(':') {
        if host[idx + 1..].chars().all(|c| c.is_ascii_digit()) && !host[idx + 1..].is_empty() {
            return host[..idx].to_string();
        }
    }
    host.to_string()
}

fn parse_timestamp(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    parse_json_timestamp_string(raw).or_else(|| {
        raw.parse::<f64>().ok().and_then(|n| {
            if n > 1e12 {
                chrono::DateTime::from_timestamp((n / 1000.0) as i64, 0)
            } else {
                chrono::DateTime::from_timestamp(n as i64, 0)
            }
        })
    })
}

#[allow(clippy::too_many_arguments)]
fn build_message(
    pid: Option<&str>,
    user: Option<&str>,
    database: Option<&str>,
    application: Option<&str>,
    host: Option<&str>,
    severity: Option<&str>,
    body: Option<&str>,
    detail: Option<&str>,
    hint: Option<&str>,
    statement: Option<&str>,
    context: Option<&str>,
    sql_state: Option<&str>,
) -> String {
    let mut out = String::new();

    if let Some(pid) = pid {
        out.push_str(&format!("[{pid}]: "));
    }

    let mut tokens = Vec::new();
    if let Some(u) = user {
        tokens.push(format!("user={u}"));
    }
    if let Some(d) = database {
        tokens.push(format!("db={d}"));
    }
    if let Some(a) = application {
        tokens.push(format!("app={a}"));
    }
    if let Some(h) = host {
        tokens.push(format!("client={h}"));
    }
    if !tokens.is_empty() {
        out.push_str(&tokens.join(","));
        out.push(' ');
    }

    match (severity, body) {
        (Some(sev), Some(body)) => out.push_str(&format!("{sev}: {body}")),
        (None, Some(body)) => out.push_str(body),
        (Some(sev), None) => out.push_str(&format!("{sev}:")),
        (None, None) => {}
    }

    if let Some(detail) = detail {
        out.push_str(&format!(" DETAIL: {detail}"));
    }
    if let Some(hint) = hint {
        out.push_str(&format!(" HINT: {hint}"));
    }
    if let Some(statement) = statement {
        out.push_str(&format!(" STATEMENT: {statement}"));
    }
    if let Some(context) = context {
        out.push_str(&format!(" CONTEXT: {context}"));
    }
    if let Some(state) = sql_state {
        if state != "00000" {
            out.push_str(&format!(" SQLSTATE = '{state}'"));
        }
    }

    out
}

fn get_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| get_string(obj, k))
}
