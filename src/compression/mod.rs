//! Transparent decompression layer: magic-byte detection plus one reader
//! adaptor per supported codec. Detection never trusts the
//! file extension alone — `.gz`/`.zst` are a hint, the magic bytes decide.

pub mod gzip;
pub mod tar_walker;
pub mod zstd_codec;

use crate::domain::SourceError;
use std::io::{self, Read};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
    Tar,
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const TAR_USTAR_OFFSET: usize = 257;
const TAR_USTAR_MAGIC: &[u8] = b"ustar";

/// Detects compression from a leading byte prefix. `prefix` should carry at
/// least 262 bytes when available so the tar ustar magic (at offset 257)
/// can be checked; shorter prefixes just skip that check.
pub fn detect_compression(prefix: &[u8]) -> Compression {
    if prefix.starts_with(&GZIP_MAGIC) {
        Compression::Gzip
    } else if prefix.starts_with(&ZSTD_MAGIC) {
        Compression::Zstd
    } else if prefix.len() >= TAR_USTAR_OFFSET + TAR_USTAR_MAGIC.len()
        && &prefix[TAR_USTAR_OFFSET..TAR_USTAR_OFFSET + TAR_USTAR_MAGIC.len()] == TAR_USTAR_MAGIC
    {
        Compression::Tar
    } else {
        Compression::None
    }
}

/// Wraps `inner` with a freshly read prefix that has already been consumed
/// elsewhere (e.g. for magic-byte sniffing or detection sampling), so the
/// bytes are replayed before the rest of the stream. Used for stdin, where
/// we cannot seek back, and for tar entries, which only support forward
/// reads.
pub struct PrependReader<R> {
    prefix: std::io::Cursor<Vec<u8>>,
    inner: R,
}

impl<R: Read> PrependReader<R> {
    pub fn new(prefix: Vec<u8>, inner: R) -> Self {
        Self {
            prefix: std::io::Cursor::new(prefix),
            inner,
        }
    }
}

impl<R: Read> Read for PrependReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let from_prefix = self.prefix.read(buf)?;
        if from_prefix > 0 {
            return Ok(from_prefix);
        }
        self.inner.read(buf)
    }
}

/// Wraps `reader` with the codec implied by `compression`, dispatching to
/// the per-format adaptor. `Compression::Tar` is handled by the caller via
/// [`tar_walker`] instead, since it yields multiple entries rather than one
/// decompressed stream.
pub fn decompress(
    compression: Compression,
    reader: Box<dyn Read + Send>,
) -> Result<Box<dyn Read + Send>, SourceError> {
    match compression {
        Compression::None => Ok(reader),
        Compression::Gzip => gzip::open(reader),
        Compression::Zstd => zstd_codec::open(reader),
        Compression::Tar => Err(SourceError::CompressionFailed(
            "tar archives must be walked entry-by-entry, not decompressed as a single stream"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_gzip_magic() {
        assert_eq!(detect_compression(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
    }

    #[test]
    fn recognizes_zstd_magic() {
        assert_eq!(
            detect_compression(&[0x28, 0xB5, 0x2F, 0xFD, 0x00]),
            Compression::Zstd
        );
    }

    #[test]
    fn plain_text_is_uncompressed() {
        assert_eq!(detect_compression(b"2025-01-02 10:00:00"), Compression::None);
    }

    #[test]
    fn prepend_reader_replays_prefix_then_inner() {
        let mut r = PrependReader::new(b"hel".to_vec(), std::io::Cursor::new(b"lo".to_vec()));
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello");
    }
}
