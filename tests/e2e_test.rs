//! End-to-end scenarios covering the full pipeline: compression, format
//! detection, parsing, prefix inference, and normalization, driven purely
//! through the public `ingest_*` entrypoints.

use pglogstream::domain::VecSink;
use pglogstream::source::{ingest_stdin, IngestOptions};
use std::io::Write;

fn run(input: &[u8]) -> VecSink {
    let mut sink = VecSink::default();
    let options = IngestOptions::default();
    ingest_stdin(std::io::Cursor::new(input.to_vec()), &mut sink, &options, None).unwrap();
    sink
}

/// Builds one PostgreSQL csvlog record, positionally, with `log_time`,
/// `user_name`, `database_name`, `error_severity`, `message`, and `detail`
/// set and every other column left empty. Columns line up with the ones
/// `csv_parser` reads (indices 0, 1, 2, 11, 13, 14).
fn csv_row(log_time: &str, user_name: &str, database_name: &str, severity: &str, message: &str) -> String {
    csv_row_with_detail(log_time, user_name, database_name, severity, message, "")
}

fn csv_row_with_detail(
    log_time: &str,
    user_name: &str,
    database_name: &str,
    severity: &str,
    message: &str,
    detail: &str,
) -> String {
    let mut fields = vec![String::new(); 15];
    fields[0] = log_time.to_string();
    fields[1] = user_name.to_string();
    fields[2] = database_name.to_string();
    fields[11] = severity.to_string();
    fields[13] = message.to_string();
    fields[14] = detail.to_string();
    let quoted: Vec<String> = fields.iter().map(|f| format!("\"{f}\"")).collect();
    format!("{}\n", quoted.join(","))
}

#[test]
fn scenario_1_plain_stderr_with_statement_continuation() {
    let input = "2025-01-02 10:00:00.123 UTC [42]: LOG:  connection authorized: user=alice database=shop\n\
                 2025-01-02 10:00:00.200 UTC [43]: ERROR:  division by zero\n\
                 \tSTATEMENT:  SELECT 1/0\n";
    let sink = run(input.as_bytes());
    assert_eq!(sink.entries.len(), 2);
    let second = &sink.entries[1].message;
    assert!(second.contains("ERROR:  division by zero"));
    assert!(second.contains("STATEMENT:  SELECT 1/0"));
    assert!(second.ends_with("SELECT 1/0"));
}

#[test]
fn scenario_2_csv_record_prepends_user_and_db() {
    let row = csv_row_with_detail(
        "2025-01-02 10:00:00.123 UTC",
        "bob",
        "shop",
        "ERROR",
        "duplicate key value",
        "Key (id)=(1) already exists.",
    );
    let sink = run(row.as_bytes());
    assert_eq!(sink.entries.len(), 1);
    assert_eq!(
        sink.entries[0].message,
        "user=bob db=shop ERROR: duplicate key value DETAIL: Key (id)=(1) already exists."
    );
}

#[test]
fn scenario_3_jsonl_line_renders_bracketed_pid_and_metadata() {
    let line = r#"{"timestamp":"2025-01-02T10:00:00.123Z","error_severity":"LOG","pid":42,"user":"carol","dbname":"shop","application_name":"psql","message":"statement: SELECT 1"}"#;
    let sink = run(line.as_bytes());
    assert_eq!(sink.entries.len(), 1);
    let entry = &sink.entries[0];
    assert!(entry.message.contains("user=carol"));
    assert!(entry.message.contains("db=shop"));
    assert!(entry.message.contains("app=psql"));
    assert!(entry.message.contains("statement: SELECT 1"));
}

#[test]
fn scenario_4_gzip_wrapped_csv_matches_plain_csv() {
    let row = csv_row(
        "2025-01-02 10:00:00.123 UTC",
        "bob",
        "shop",
        "ERROR",
        "duplicate key value",
    );
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(row.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let plain_sink = run(row.as_bytes());
    let gz_sink = run(&compressed);
    assert_eq!(plain_sink.entries.len(), gz_sink.entries.len());
    assert_eq!(plain_sink.entries[0].message, gz_sink.entries[0].message);
}

#[test]
fn scenario_5_syslog_interleaved_backends_reassemble_independently() {
    let input = "Jan  2 10:00:00 h postgres[42]: [1-1] LOG:  duration: 5 ms  statement: SELECT 1\n\
                 Jan  2 10:00:00 h postgres[43]: [2-1] LOG:  duration: 7 ms  statement: SELECT 2\n\
                 Jan  2 10:00:00 h postgres[42]: [1-2]         FROM t\n";
    let sink = run(input.as_bytes());
    assert_eq!(sink.entries.len(), 2);

    let pid_42 = sink
        .entries
        .iter()
        .find(|e| e.message.contains("SELECT 1"))
        .expect("pid 42's record should be present");
    assert!(pid_42.message.contains("FROM t"));

    let pid_43 = sink
        .entries
        .iter()
        .find(|e| e.message.contains("SELECT 2"))
        .expect("pid 43's record should be present");
    assert!(!pid_43.message.contains("FROM t"));
}

#[test]
fn scenario_6_zstd_tar_archive_concatenates_member_entries_in_order() {
    let log_raw = b"2025-01-02 10:00:00.123 UTC [1]: LOG:  connection received\n".to_vec();
    let mut gz_encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    gz_encoder.write_all(&log_raw).unwrap();
    let log_gz = gz_encoder.finish().unwrap();

    let csv_raw = csv_row("2025-01-02 10:00:01.000 UTC", "bob", "shop", "LOG", "autovacuum").into_bytes();

    let mut tar_bytes = Vec::new();
    {
        let mut builder = tar::Builder::new(&mut tar_bytes);
        let mut header = tar::Header::new_ustar();
        header.set_path("server.log.gz").unwrap();
        header.set_size(log_gz.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, log_gz.as_slice()).unwrap();

        let mut header = tar::Header::new_ustar();
        header.set_path("server.csv").unwrap();
        header.set_size(csv_raw.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, csv_raw.as_slice()).unwrap();
        builder.finish().unwrap();
    }

    let archive = zstd::stream::encode_all(tar_bytes.as_slice(), 0).unwrap();
    let sink = run(&archive);

    assert_eq!(sink.entries.len(), 2);
    assert!(sink.entries[0].message.contains("connection received"));
    assert!(sink.entries[1].message.contains("autovacuum"));
}
