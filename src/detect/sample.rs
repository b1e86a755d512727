//! The bounded sample reader used by detection before a format parser is
//! committed to: read up to `MAX_SAMPLE_BYTES`; if a newline is present,
//! truncate at the last one so detection never has to reason about a
//! partial final line; otherwise keep reading up to 5 complete lines or
//! EOF, whichever comes first.

use crate::domain::{SourceError, MAX_SAMPLE_BYTES};
use std::io::Read;

const MAX_SAMPLE_LINES: usize = 5;

/// Reads a detection sample from `reader` without consuming more than is
/// needed; callers that need to replay the sample (e.g. stdin) must prepend
/// it themselves — this function does not rewind.
pub fn read_sample<R: Read>(reader: &mut R) -> Result<Vec<u8>, SourceError> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    let mut newline_count = 0usize;

    loop {
        if buf.len() >= MAX_SAMPLE_BYTES {
            break;
        }
        let want = (MAX_SAMPLE_BYTES - buf.len()).min(chunk.len());
        let n = reader.read(&mut chunk[..want])?;
        if n == 0 {
            break;
        }
        newline_count += chunk[..n].iter().filter(|&&b| b == b'\n').count();
        buf.extend_from_slice(&chunk[..n]);
        if newline_count >= MAX_SAMPLE_LINES {
            break;
        }
    }

    if buf.is_empty() {
        return Err(SourceError::Empty);
    }

    if let Some(last_nl) = buf.iter().rposition(|&b| b == b'\n') {
        buf.truncate(last_nl + 1);
    }

    Ok(buf)
}
