//! Zstd decoding via the streaming `zstd::stream::read::Decoder`: raise
//! `window_log_max` so archives produced with `--long` windows (common
//! for log bundles) don't fail.

use crate::domain::SourceError;
use std::io::Read;

const WINDOW_LOG_MAX: u32 = 31;

pub fn open(reader: Box<dyn Read + Send>) -> Result<Box<dyn Read + Send>, SourceError> {
    let mut decoder = zstd::stream::read::Decoder::new(reader)
        .map_err(|e| SourceError::CompressionFailed(e.to_string()))?;
    decoder
        .window_log_max(WINDOW_LOG_MAX)
        .map_err(|e| SourceError::CompressionFailed(e.to_string()))?;
    Ok(Box::new(decoder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round_trips_through_decoder() {
        let payload = b"2025-01-02 10:00:00 UTC [1]: LOG:  hi\n".to_vec();
        let mut encoder = zstd::stream::write::Encoder::new(Vec::new(), 0).unwrap();
        encoder.write_all(&payload).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut reader = open(Box::new(std::io::Cursor::new(compressed))).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, payload);
    }
}
