//! stderr/syslog log parsing: mode selection between the plain multi-line
//! assembler (Mode A) and the per-pid syslog assembler (Mode B), plus the
//! optional mmap fast path for plain on-disk files.

pub mod assembler;
pub mod line;
pub mod mmap_scan;
pub mod syslog;

use crate::domain::RecordWarning;
use chrono::{DateTime, Utc};
use std::io::{BufRead, BufReader, Read};

pub struct StderrRecord {
    pub timestamp: DateTime<Utc>,
    pub raw: String,
}

pub struct StderrParseOutcome {
    pub entries: Vec<StderrRecord>,
    pub warnings: Vec<RecordWarning>,
}

/// Mode B is selected when the sample shows a `name[pid]:` process tag
/// immediately following a BSD-style timestamp; otherwise Mode A applies.
pub fn detect_mode(sample: &str, now: DateTime<Utc>) -> Mode {
    for line in sample.lines() {
        if let Some(line::Head::Syslog { .. }) = line::classify(line, now) {
            return Mode::Syslog;
        }
        if let Some(line::Head::Plain { .. }) = line::classify(line, now) {
            return Mode::Plain;
        }
    }
    Mode::Plain
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Plain,
    Syslog,
}

/// Syslog transport renders PostgreSQL's own tab-indented continuation
/// prefix as the literal 4-character escape `#011` rather than a real tab
/// byte. Collapse it to a single space so continuation text reads the same
/// whether it arrived over syslog or a plain file.
pub(crate) fn rewrite_tab_marker(line: &str) -> std::borrow::Cow<'_, str> {
    if line.contains("#011") {
        std::borrow::Cow::Owned(line.replace("#011", " "))
    } else {
        std::borrow::Cow::Borrowed(line)
    }
}

/// Parses a full stderr/syslog stream, auto-selecting Mode A or Mode B
/// from the leading content.
pub fn parse<R: Read>(reader: R, now: DateTime<Utc>) -> std::io::Result<StderrParseOutcome> {
    let mut buffered = BufReader::new(reader);
    let mut first_chunk = Vec::new();
    {
        let peek = buffered.fill_buf()?;
        first_chunk.extend_from_slice(peek);
    }
    let sample_text = String::from_utf8_lossy(&first_chunk);
    let mode = detect_mode(&sample_text, now);

    match mode {
        Mode::Plain => parse_plain(buffered, now),
        Mode::Syslog => parse_syslog(buffered, now),
    }
}

fn parse_plain<R: BufRead>(reader: R, now: DateTime<Utc>) -> std::io::Result<StderrParseOutcome> {
    let mut asm = assembler::Assembler::new();
    let mut entries = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if let Some(rec) = asm.feed(&line, now) {
            entries.push(StderrRecord {
                timestamp: rec.timestamp,
                raw: rec.raw,
            });
        }
    }
    if let Some(rec) = asm.finish() {
        entries.push(StderrRecord {
            timestamp: rec.timestamp,
            raw: rec.raw,
        });
    }

    Ok(StderrParseOutcome {
        entries,
        warnings: Vec::new(),
    })
}

fn parse_syslog<R: BufRead>(reader: R, now: DateTime<Utc>) -> std::io::Result<StderrParseOutcome> {
    let mut asm = syslog::SyslogAssembler::new();
    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if let Some(pid) = asm.feed(&line, now) {
            warnings.push(RecordWarning::OrphanSyslogContinuation { pid });
        }
        for rec in asm.drain_closed() {
            entries.push(StderrRecord {
                timestamp: rec.timestamp,
                raw: rec.raw,
            });
        }
    }
    for rec in asm.finish() {
        entries.push(StderrRecord {
            timestamp: rec.timestamp,
            raw: rec.raw,
        });
    }

    Ok(StderrParseOutcome { entries, warnings })
}
