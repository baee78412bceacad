//! L0: the `/proc/<pid>/mem` reader.
//!
//! Opens, seeks, reads, and closes the file handle on every call rather
//! than caching it — a cached handle can go silently stale across an exec
//! or a remap, and the saved `open(2)` call isn't worth that risk.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// Reads `size` bytes from `/proc/<pid>/mem` at `offset`.
///
/// Only usable against currently-readable mappings. A short read surfaces
/// as a plain `io::Error`, not a dedicated error kind — this path obeys
/// the same page permissions as [`crate::uio::read_vm`], it just goes
/// through the filesystem instead of a dedicated syscall.
pub fn read(pid: i32, offset: u64, size: usize) -> io::Result<Vec<u8>> {
    let mut f = File::open(format!("/proc/{}/mem", pid))?;
    f.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; size];
    f.read_exact(&mut buf)?;
    Ok(buf)
}
