//! Thin CLI front end: wires argument parsing to the library's `ingest_*`
//! entrypoints and serializes the surviving entries as JSON lines on
//! stdout. All ingestion semantics live in the library; this binary owns
//! only argument parsing, logging setup, and output formatting.

use chrono::{DateTime, Utc};
use clap::Parser;
use pglogstream::domain::{Sink, SinkError};
use pglogstream::{ingest_path, ingest_stdin, Filter, IngestOptions, LogEntry};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Streams normalized PostgreSQL log entries as JSON lines.
#[derive(Parser, Debug)]
#[command(name = "pglogstream", version, about)]
struct Cli {
    /// Paths to log files (plain, gzip, zstd, or tar), or `-` for stdin.
    /// Given more than one, each is ingested in turn; a failed source is
    /// logged and skipped rather than aborting the whole run.
    #[arg(default_value = "-")]
    paths: Vec<String>,

    /// Only emit entries at or after this RFC3339 instant.
    #[arg(long)]
    since: Option<DateTime<Utc>>,

    /// Only emit entries at or before this RFC3339 instant.
    #[arg(long)]
    until: Option<DateTime<Utc>>,

    /// Only emit entries for these database names (repeatable).
    #[arg(long = "db")]
    db: Vec<String>,

    /// Only emit entries for these users (repeatable).
    #[arg(long = "user")]
    user: Vec<String>,

    /// Only emit entries for these application names (repeatable).
    #[arg(long = "app")]
    app: Vec<String>,

    /// Drop entries from these users, even if `--user` also matches them.
    #[arg(long = "exclude-user")]
    exclude_user: Vec<String>,

    /// Only emit entries whose message contains this substring (repeatable).
    #[arg(long)]
    grep: Vec<String>,
}

struct JsonLineSink<W: Write> {
    out: W,
}

impl<W: Write> Sink for JsonLineSink<W> {
    fn emit(&mut self, entry: LogEntry) -> Result<(), SinkError> {
        let line = serde_json::to_string(&JsonEntry::from(&entry)).map_err(|_| SinkError::Closed)?;
        writeln!(self.out, "{line}").map_err(|_| SinkError::Closed)
    }
}

#[derive(serde::Serialize)]
struct JsonEntry {
    timestamp: DateTime<Utc>,
    message: String,
}

impl From<&LogEntry> for JsonEntry {
    fn from(entry: &LogEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            message: entry.message.clone(),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let filter = Filter::new()
        .with_time_window(cli.since, cli.until)
        .with_db_whitelist(cli.db)
        .with_user_whitelist(cli.user)
        .with_app_whitelist(cli.app)
        .with_user_blacklist(cli.exclude_user)
        .with_grep_all(cli.grep);
    let options = IngestOptions {
        filter,
        dictionaries: Default::default(),
    };

    let stdout = std::io::stdout();
    let mut sink = JsonLineSink { out: stdout.lock() };

    let mut any_succeeded = false;
    let mut any_failed = false;

    for path in &cli.paths {
        let result = if path == "-" {
            ingest_stdin(std::io::stdin().lock(), &mut sink, &options, None)
        } else {
            ingest_path(&PathBuf::from(path), &mut sink, &options, None)
        };

        match result {
            Ok(()) => any_succeeded = true,
            Err(e) => {
                any_failed = true;
                eprintln!("[ERROR] {path}: {e}");
                tracing::error!(path = %path, error = %e, "source ingestion failed");
            }
        }
    }

    if any_succeeded || !any_failed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
