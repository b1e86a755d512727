//! Top-level entrypoints: walks a path or stdin through
//! compression detection, format detection, the matching parser, prefix
//! inference (stderr/syslog only), normalization, and the filter stage,
//! pushing surviving entries into a [`Sink`]. Single-producer: one thread
//! reads and decodes a source end to end; concurrency, where it exists
//! (multiple sources), lives above this layer, one call per source.

use crate::compression::{self, Compression, PrependReader};
use crate::detect::{self, ParserKind};
use crate::domain::{Sink, SinkError, SourceError};
use crate::normalize;
use crate::parser::{csv_parser, json_parser, stderr};
use crate::prefix_infer;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tokio_util::sync::CancellationToken;

const COMPRESSION_PREFIX_LEN: usize = 1024;
const PREFIX_SAMPLE_COUNT: usize = 20;

#[derive(Debug, Default, Clone)]
pub struct IngestOptions {
    pub filter: crate::domain::Filter,
    pub dictionaries: prefix_infer::dictionaries::Dictionaries,
}

/// Ingests a single path: a plain file, a compressed file, or a tar
/// archive (itself possibly containing compressed members). `cancel`, if
/// given, is checked once per emitted record — an abort lands at the next
/// read boundary rather than mid-record.
pub fn ingest_path<S: Sink>(
    path: &Path,
    sink: &mut S,
    options: &IngestOptions,
    cancel: Option<&CancellationToken>,
) -> Result<(), SourceError> {
    let file = File::open(path)?;
    ingest_reader(path, file, sink, options, cancel)
}

/// Ingests stdin (or any other non-seekable stream). The detection sample
/// and compression prefix are read once and replayed ahead of the rest of
/// the stream via [`PrependReader`], since we can't seek back.
pub fn ingest_stdin<R: Read + Send, S: Sink>(
    reader: R,
    sink: &mut S,
    options: &IngestOptions,
    cancel: Option<&CancellationToken>,
) -> Result<(), SourceError> {
    ingest_reader(Path::new("stdin"), reader, sink, options, cancel)
}

fn ingest_reader<R: Read + Send, S: Sink>(
    name_hint: &Path,
    mut reader: R,
    sink: &mut S,
    options: &IngestOptions,
    cancel: Option<&CancellationToken>,
) -> Result<(), SourceError> {
    let mut prefix = vec![0u8; COMPRESSION_PREFIX_LEN];
    let n = read_up_to(&mut reader, &mut prefix)?;
    prefix.truncate(n);

    if prefix.is_empty() {
        return Err(SourceError::Empty);
    }

    let now = Utc::now();
    let mut compression = compression::detect_compression(&prefix);
    let mut current: Box<dyn Read + Send> = Box::new(PrependReader::new(prefix, reader));

    // A source can be compressed more than once deep, e.g. `bundle.tar.zst`:
    // the outer magic bytes are zstd's, and only after inflating that layer
    // does the ustar header become visible. Peel one layer at a time until
    // we land on an archive (walked, not decoded further) or plain content.
    loop {
        match compression {
            Compression::Tar => {
                return ingest_tar(current, sink, options, now, cancel);
            }
            Compression::None => {
                let count = parse_and_emit(
                    name_hint,
                    current,
                    now,
                    sink,
                    &options.filter,
                    &options.dictionaries,
                    cancel,
                )?;
                tracing::debug!(path = %name_hint.display(), emitted = count, "source ingested");
                return Ok(());
            }
            Compression::Gzip | Compression::Zstd => {
                let decompressed = compression::decompress(compression, current)?;
                let (next_compression, next_reader) = peek_compression(decompressed)?;
                compression = next_compression;
                current = next_reader;
            }
        }
    }
}

/// Reads a fresh detection prefix off an already-decompressed layer and
/// classifies it, so nested archives (`.tar.gz`, `.tar.zst`) are recognized
/// before falling through to format detection.
fn peek_compression(
    mut reader: Box<dyn Read + Send>,
) -> Result<(Compression, Box<dyn Read + Send>), SourceError> {
    let mut prefix = vec![0u8; COMPRESSION_PREFIX_LEN];
    let n = read_up_to(&mut reader, &mut prefix)?;
    prefix.truncate(n);
    let compression = compression::detect_compression(&prefix);
    let next: Box<dyn Read + Send> = Box::new(PrependReader::new(prefix, reader));
    Ok((compression, next))
}

fn ingest_tar<R: Read, S: Sink>(
    reader: R,
    sink: &mut S,
    options: &IngestOptions,
    now: DateTime<Utc>,
    cancel: Option<&CancellationToken>,
) -> Result<(), SourceError> {
    compression::tar_walker::walk(
        reader,
        |name, body| {
            let entry_path = Path::new(&name);
            match parse_and_emit(
                entry_path,
                body,
                now,
                sink,
                &options.filter,
                &options.dictionaries,
                cancel,
            ) {
                Ok(count) => {
                    tracing::debug!(entry = %name, emitted = count, "tar entry ingested");
                    Ok(())
                }
                Err(SourceError::UnknownFormat) | Err(SourceError::Binary) => {
                    tracing::warn!(entry = %name, "skipping tar entry with unrecognized content");
                    Ok(())
                }
                Err(e) => Err(e),
            }
        },
        |warning| tracing::warn!(%warning, "skipping tar entry"),
    )
}

/// Runs format detection, the matching parser, and (for stderr/syslog)
/// prefix inference over one already-decompressed stream, emitting every
/// surviving record into `sink`. Returns the number of records emitted.
fn parse_and_emit<R: Read, S: Sink>(
    name_hint: &Path,
    mut reader: R,
    now: DateTime<Utc>,
    sink: &mut S,
    filter: &crate::domain::Filter,
    dictionaries: &prefix_infer::dictionaries::Dictionaries,
    cancel: Option<&CancellationToken>,
) -> Result<usize, SourceError> {
    let (kind, sample) = detect::detect(name_hint, &mut reader)?;
    let full = PrependReader::new(sample, reader);
    let mut emitted = 0usize;

    match kind {
        ParserKind::Csv => {
            let outcome = csv_parser::parse(full)?;
            for warning in &outcome.warnings {
                tracing::warn!(%warning, "skipping CSV record");
            }
            for (entry, metadata) in outcome.entries {
                let normalized = normalize::normalize(entry.timestamp, &metadata);
                if !emit_if_passes(normalized, filter, sink, cancel)? {
                    break;
                }
                emitted += 1;
            }
        }
        ParserKind::Json => {
            let outcome = json_parser::parse(full)?;
            for warning in &outcome.warnings {
                tracing::warn!(%warning, "skipping JSON record");
            }
            for (entry, metadata) in outcome.entries {
                let normalized = normalize::normalize(entry.timestamp, &metadata);
                if !emit_if_passes(normalized, filter, sink, cancel)? {
                    break;
                }
                emitted += 1;
            }
        }
        ParserKind::Stderr => {
            let outcome = stderr::parse(full, now)?;
            for warning in &outcome.warnings {
                tracing::warn!(%warning, "skipping stderr record");
            }
            let samples: Vec<String> = outcome
                .entries
                .iter()
                .take(PREFIX_SAMPLE_COUNT)
                .map(|r| r.raw.clone())
                .collect();
            let structure = prefix_infer::infer_structure_with_dictionaries(&samples, dictionaries);
            for record in outcome.entries {
                let metadata = prefix_infer::apply_with_dictionaries(&structure, &record.raw, dictionaries);
                let normalized = normalize::normalize(record.timestamp, &metadata);
                if !emit_if_passes(normalized, filter, sink, cancel)? {
                    break;
                }
                emitted += 1;
            }
        }
    }

    Ok(emitted)
}

/// Applies the filter stage and emits into the sink. Returns `Ok(false)`
/// to signal the caller should stop (cancellation requested, or the sink
/// has been closed downstream) rather than treating either as fatal.
fn emit_if_passes<S: Sink>(
    entry: crate::domain::LogEntry,
    filter: &crate::domain::Filter,
    sink: &mut S,
    cancel: Option<&CancellationToken>,
) -> Result<bool, SourceError> {
    if let Some(token) = cancel {
        if token.is_cancelled() {
            return Ok(false);
        }
    }
    if !filter.is_empty() && !crate::filter_stage::passes(&entry, filter) {
        return Ok(true);
    }
    match sink.emit(entry) {
        Ok(()) => Ok(true),
        Err(SinkError::Closed) => Ok(false),
    }
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
