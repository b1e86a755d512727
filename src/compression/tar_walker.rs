//! Tar archive walking: each regular-file entry is sniffed
//! for its own (possibly absent) nested compression and handed to the
//! caller; everything else — directories, symlinks, anything `tar::Entry`
//! doesn't resolve to a plain file — is reported and its body drained by
//! the underlying `tar` crate as the iterator advances past it.

use super::{detect_compression, Compression};
use crate::domain::{RecordWarning, SourceError};
use std::io::Read;
use tar::{Archive, EntryType};

const SNIFF_LEN: usize = 262; // enough for gzip/zstd magic and the ustar tar magic

/// Calls `on_entry` once per regular-file archive member with its path and
/// an already-decompressed reader; calls `on_skip` for anything else.
/// `on_entry` must fully consume (or explicitly drop) the reader before
/// returning so the archive cursor can advance — the `tar` crate drains
/// any unread bytes of the current entry automatically on the next
/// `next()` call.
pub fn walk<R, FEntry, FSkip>(
    reader: R,
    mut on_entry: FEntry,
    mut on_skip: FSkip,
) -> Result<(), SourceError>
where
    R: Read,
    FEntry: FnMut(String, Box<dyn Read + '_>) -> Result<(), SourceError>,
    FSkip: FnMut(RecordWarning),
{
    let mut archive = Archive::new(reader);
    let entries = archive.entries()?;

    for entry in entries {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();

        if entry.header().entry_type() != EntryType::Regular {
            on_skip(RecordWarning::UnsupportedTarEntry { name });
            continue;
        }

        let mut prefix = vec![0u8; SNIFF_LEN];
        let n = read_up_to(&mut entry, &mut prefix)?;
        prefix.truncate(n);

        let compression = detect_compression(&prefix);
        let prefixed: Box<dyn Read> = Box::new(super::PrependReader::new(prefix, entry));
        let body = match compression {
            Compression::Tar => {
                // A tar-in-tar member: not handled recursively, report and
                // let the archive skip its remaining bytes.
                on_skip(RecordWarning::UnsupportedTarEntry { name });
                continue;
            }
            Compression::None => prefixed,
            Compression::Gzip | Compression::Zstd => {
                decompress_non_send(compression, prefixed)?
            }
        };

        on_entry(name, body)?;
    }

    Ok(())
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

/// `decompress` in the parent module requires `Send` because top-level
/// sources run on a blocking task; tar entries borrow the archive and
/// can't be `Send`, so the two codecs are reimplemented here against a
/// non-`Send` reader instead of reusing that entrypoint.
fn decompress_non_send<'a>(
    compression: Compression,
    reader: Box<dyn Read + 'a>,
) -> Result<Box<dyn Read + 'a>, SourceError> {
    match compression {
        Compression::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
        Compression::Zstd => {
            let mut decoder = zstd::stream::read::Decoder::new(reader)
                .map_err(|e| SourceError::CompressionFailed(e.to_string()))?;
            decoder
                .window_log_max(31)
                .map_err(|e| SourceError::CompressionFailed(e.to_string()))?;
            Ok(Box::new(decoder))
        }
        Compression::None | Compression::Tar => unreachable!("filtered by caller"),
    }
}
