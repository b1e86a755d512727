//! Format autodetection: extension first, content sniffing as the
//! fallback and as a cross-check against a misleading extension.

use crate::detect::sample::read_sample;
use crate::detect::validators::{is_binary, is_csv, is_json, is_log};
use crate::domain::SourceError;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    Stderr,
    Csv,
    Json,
}

impl ParserKind {
    fn matches_sample(self, sample: &[u8]) -> bool {
        match self {
            ParserKind::Stderr => is_log(sample),
            ParserKind::Csv => is_csv(sample),
            ParserKind::Json => is_json(sample),
        }
    }
}

/// Extension-implied kind, if the name carries one we recognize. `.gz`,
/// `.zst`, `.tar` and friends are stripped by the compression layer before
/// this is consulted — this function only ever sees the innermost name.
fn kind_from_extension(path: &Path) -> Option<ParserKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(ParserKind::Csv),
        "json" | "jsonl" | "ndjson" => Some(ParserKind::Json),
        "log" | "err" | "stderr" | "txt" => Some(ParserKind::Stderr),
        _ => None,
    }
}

/// Runs the full detection algorithm: extension hint first, validated
/// against the sample; falls back to content sniffing in priority order
/// (JSON, then CSV, then stderr/syslog) when the extension is absent or
/// doesn't carry a recognized format.
pub fn detect<R: Read>(path: &Path, reader: &mut R) -> Result<(ParserKind, Vec<u8>), SourceError> {
    let sample = read_sample(reader)?;
    if is_binary(&sample) {
        return Err(SourceError::Binary);
    }

    if let Some(hinted) = kind_from_extension(path) {
        if hinted.matches_sample(&sample) {
            return Ok((hinted, sample));
        }
        return Err(SourceError::InvalidFormatForExtension {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_string(),
        });
    }

    for candidate in [ParserKind::Json, ParserKind::Csv, ParserKind::Stderr] {
        if candidate.matches_sample(&sample) {
            return Ok((candidate, sample));
        }
    }

    Err(SourceError::UnknownFormat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    #[test]
    fn extension_hint_is_trusted_when_content_matches() {
        let mut cursor = Cursor::new(
            b"\"2025-01-02 10:00:00 UTC\",\"u\",\"d\",42,,,,,,,,,\"LOG\",,\"hi\"\n".to_vec(),
        );
        let (kind, _) = detect(&PathBuf::from("postgresql.csv"), &mut cursor).unwrap();
        assert_eq!(kind, ParserKind::Csv);
    }

    #[test]
    fn mismatched_extension_is_an_error() {
        let mut cursor = Cursor::new(b"2025-01-02 10:00:00.123 UTC [42]: LOG:  hi\n".to_vec());
        let err = detect(&PathBuf::from("postgresql.csv"), &mut cursor).unwrap_err();
        assert!(matches!(
            err,
            SourceError::InvalidFormatForExtension { .. }
        ));
    }

    #[test]
    fn falls_back_to_content_sniffing_without_extension() {
        let mut cursor = Cursor::new(b"{\"time\":\"2025-01-02 10:00:00 UTC\"}\n".to_vec());
        let (kind, _) = detect(&PathBuf::from("stdin"), &mut cursor).unwrap();
        assert_eq!(kind, ParserKind::Json);
    }

    #[test]
    fn unknown_content_is_an_error() {
        let mut cursor = Cursor::new(b"nothing recognizable here\n".to_vec());
        let err = detect(&PathBuf::from("stdin"), &mut cursor).unwrap_err();
        assert!(matches!(err, SourceError::UnknownFormat));
    }

    #[test]
    fn binary_content_is_rejected_before_any_other_check() {
        let mut cursor = Cursor::new(b"\x00\x01\x02binary".to_vec());
        let err = detect(&PathBuf::from("stdin"), &mut cursor).unwrap_err();
        assert!(matches!(err, SourceError::Binary));
    }
}
