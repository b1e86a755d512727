//! Memory-mapped fast path for plain, uncompressed stderr/syslog files
//! opened directly from disk (never used for stdin, compressed sources, or
//! tar members — those don't have a stable file descriptor to map).

#![cfg(all(feature = "mmap", unix))]

use memmap2::Mmap;
use std::fs::File;
use std::io;

pub struct MappedLines {
    mmap: Mmap,
}

impl MappedLines {
    pub fn open(file: &File) -> io::Result<Self> {
        // Safety: the file is not concurrently truncated by this process;
        // a racing external truncation can SIGBUS, which is the accepted
        // tradeoff made by every mmap-based log reader in the ecosystem.
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap })
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.mmap
            .split(|&b| b == b'\n')
            .filter_map(|chunk| std::str::from_utf8(chunk).ok())
    }
}
