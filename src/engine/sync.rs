//! Synchronous descriptor backend
//!
//! This backend moves data with blocking `pread`/`pwrite` syscalls on the raw
//! descriptor of each open file and flushes with `fsync`. It is the baseline
//! backend on Unix.
//!
//! # Features
//!
//! - Uses pread/pwrite for positioned IO without touching the file offset
//! - Handles partial reads/writes by retrying until complete
//! - Interrupted syscalls (EINTR) are restarted
//!
//! # Example
//!
//! ```no_run
//! use fsdrill::engine::{IoBackend, FillKind};
//! use fsdrill::engine::sync::SyncBackend;
//! use std::path::Path;
//!
//! let mut backend = SyncBackend::new(None);
//! backend.write_fill(Path::new("/tmp/zero.dat"), 10 * 1024, 32 * 1024, FillKind::Zero, true)?;
//! # Ok::<(), fsdrill::error::DrillError>(())
//! ```

use super::primitives::{self, PositionedIo};
use super::{AccessPattern, BackendCapabilities, FillKind, IoBackend};
use crate::error::DrillResult;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// pread/pwrite on raw descriptors
struct DescriptorIo;

impl DescriptorIo {
    /// Perform a read using pread
    ///
    /// Reads from the descriptor at `offset` until `buf` is full or EOF.
    #[inline(always)]
    fn do_read(&self, fd: i32, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut total_read = 0;

        while total_read < buf.len() {
            let remaining = &mut buf[total_read..];
            let current_offset = offset + total_read as u64;

            // SAFETY: `remaining` is a valid, exclusively borrowed slice of
            // `remaining.len()` bytes for the duration of the call.
            let result = unsafe {
                libc::pread(
                    fd,
                    remaining.as_mut_ptr() as *mut libc::c_void,
                    remaining.len(),
                    current_offset as libc::off_t,
                )
            };

            if result < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            if result == 0 {
                // EOF
                break;
            }

            total_read += result as usize;
        }

        Ok(total_read)
    }

    /// Perform a write using pwrite
    ///
    /// Writes all of `buf` at `offset`, retrying partial writes.
    #[inline(always)]
    fn do_write(&self, fd: i32, buf: &[u8], offset: u64) -> io::Result<()> {
        let mut total_written = 0;

        while total_written < buf.len() {
            let remaining = &buf[total_written..];
            let current_offset = offset + total_written as u64;

            // SAFETY: `remaining` is a valid slice of `remaining.len()` bytes
            // for the duration of the call.
            let result = unsafe {
                libc::pwrite(
                    fd,
                    remaining.as_ptr() as *const libc::c_void,
                    remaining.len(),
                    current_offset as libc::off_t,
                )
            };

            if result < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            if result == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("pwrite wrote 0 bytes at offset {}", current_offset),
                ));
            }

            total_written += result as usize;
        }

        Ok(())
    }

    /// Synchronize data and metadata of the descriptor
    fn do_fsync(&self, fd: i32) -> io::Result<()> {
        // SAFETY: fsync only requires a valid descriptor, which the caller's
        // borrowed File guarantees.
        let result = unsafe { libc::fsync(fd) };

        if result < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(())
    }
}

impl PositionedIo for DescriptorIo {
    fn read_at(&self, file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        self.do_read(file.as_raw_fd(), buf, offset)
    }

    fn write_all_at(&self, file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
        self.do_write(file.as_raw_fd(), buf, offset)
    }

    fn sync_data(&self, file: &File) -> io::Result<()> {
        self.do_fsync(file.as_raw_fd())
    }
}

/// Synchronous backend using pread/pwrite
///
/// Each instance owns its own generator for shuffles and random offsets, so
/// one backend per worker thread needs no locking.
pub struct SyncBackend {
    io: DescriptorIo,
    rng: Xoshiro256PlusPlus,
}

impl SyncBackend {
    /// Create a backend, optionally with a fixed seed for reproducible runs
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        Self { io: DescriptorIo, rng }
    }
}

impl Default for SyncBackend {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IoBackend for SyncBackend {
    fn write_fill(
        &mut self,
        path: &Path,
        size: u64,
        block_size: u64,
        fill: FillKind,
        durable: bool,
    ) -> DrillResult<u64> {
        primitives::write_fill(&self.io, path, size, block_size, fill, durable)
    }

    fn write_random_block(&mut self, path: &Path, block_size: u64, durable: bool) -> DrillResult<u64> {
        primitives::write_random_block(&self.io, &mut self.rng, path, block_size, durable)
    }

    fn copy(
        &mut self,
        src: &Path,
        dst: &Path,
        block_size: u64,
        order: AccessPattern,
        durable: bool,
    ) -> DrillResult<u64> {
        primitives::copy(&self.io, &mut self.rng, src, dst, block_size, order, durable)
    }

    fn read_sweep(&mut self, path: &Path, block_size: u64, order: AccessPattern) -> DrillResult<u64> {
        primitives::read_sweep(&self.io, &mut self.rng, path, block_size, order)
    }

    fn read_random_block(&mut self, path: &Path, block_size: u64) -> DrillResult<u64> {
        primitives::read_random_block(&self.io, &mut self.rng, path, block_size)
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            name: "sync",
            raw_descriptors: true,
            positioned_io: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KB: u64 = 1024;

    fn backend() -> SyncBackend {
        SyncBackend::new(Some(0xfeed))
    }

    #[test]
    fn test_write_fill_zero_smaller_than_block() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zero_1.out");

        let written = backend().write_fill(&path, 10 * KB, 32 * KB, FillKind::Zero, false).unwrap();
        assert_eq!(written, 10240);

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 10240);
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_fill_durable_multi_block() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zero_2.out");

        backend().write_fill(&path, 10 * KB, KB, FillKind::Zero, true).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 10 * KB);
    }

    #[test]
    fn test_write_fill_truncates_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("shrink.out");
        std::fs::write(&path, vec![0xAB; 8192]).unwrap();

        backend().write_fill(&path, 100, 64, FillKind::Zero, false).unwrap();
        let data = std::fs::read(&path).unwrap();
        assert_eq!(data, vec![0u8; 100]);
    }

    #[test]
    fn test_write_fill_pseudo_random_repeats() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("srand.out");

        backend().write_fill(&path, 4 * KB + 100, KB, FillKind::PseudoRandomRepeating, false).unwrap();
        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len() as u64, 4 * KB + 100);
        let block = &data[..KB as usize];
        for chunk in data.chunks(KB as usize) {
            assert_eq!(chunk, &block[..chunk.len()]);
        }
    }

    #[test]
    fn test_write_fill_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.out");

        assert_eq!(backend().write_fill(&path, 0, KB, FillKind::Random, false).unwrap(), 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_write_fill_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no/such/dir/file.out");

        let err = backend().write_fill(&path, KB, KB, FillKind::Zero, false).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_write_random_block_overwrites_one_window() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rand_blk_2.out");
        let mut backend = backend();
        backend.write_fill(&path, 32 * KB, 32 * KB, FillKind::Zero, false).unwrap();

        backend.write_random_block(&path, 8 * KB, true).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len() as u64, 32 * KB);
        let first = data.iter().position(|&b| b != 0).unwrap();
        let last = data.iter().rposition(|&b| b != 0).unwrap();
        assert!(last - first < 8 * KB as usize);
        assert!(last < 32 * KB as usize);
    }

    #[test]
    fn test_write_random_block_too_large() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rand_blk_1.out");
        let mut backend = backend();
        backend.write_fill(&path, 32 * KB, 64 * KB, FillKind::Zero, false).unwrap();

        let err = backend.write_random_block(&path, 128 * KB, false).unwrap_err();
        assert!(err.is_invalid_argument());
        // File untouched
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 32 * KB);
    }

    #[test]
    fn test_copy_identical_for_every_order() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("random_1.out");
        let mut backend = backend();
        // 40 full blocks plus a 100-byte tail
        backend.write_fill(&src, 40 * KB + 100, 8 * KB, FillKind::Random, false).unwrap();
        let expected = std::fs::read(&src).unwrap();

        for (i, order) in [AccessPattern::Sequential, AccessPattern::Converging, AccessPattern::RandomShuffle]
            .into_iter()
            .enumerate()
        {
            let dst = temp_dir.path().join(format!("copy_{}.out", i));
            let copied = backend.copy(&src, &dst, KB, order, i == 0).unwrap();
            assert_eq!(copied, expected.len() as u64, "order {}", order);
            assert_eq!(std::fs::read(&dst).unwrap(), expected, "order {}", order);
        }
    }

    #[test]
    fn test_copy_into_directory() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("zero_3.out");
        let out_dir = temp_dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let mut backend = backend();
        backend.write_fill(&src, 3 * KB, KB, FillKind::Zero, false).unwrap();

        backend.copy(&src, &out_dir, KB, AccessPattern::Sequential, false).unwrap();
        assert_eq!(std::fs::metadata(out_dir.join("zero_3.out")).unwrap().len(), 3 * KB);
    }

    #[test]
    fn test_copy_onto_itself_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("self.out");
        let mut backend = backend();
        backend.write_fill(&src, 4 * KB, KB, FillKind::PseudoRandomRepeating, false).unwrap();
        let before = std::fs::read(&src).unwrap();

        let err = backend.copy(&src, &src, KB, AccessPattern::Sequential, false).unwrap_err();
        assert!(err.is_invalid_argument());

        // Directory resolving back to the source itself
        let err = backend
            .copy(&src, temp_dir.path(), KB, AccessPattern::Converging, false)
            .unwrap_err();
        assert!(err.is_invalid_argument());

        assert_eq!(std::fs::read(&src).unwrap(), before);
    }

    #[test]
    fn test_copy_single_block_order_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.out");
        let mut backend = backend();
        backend.write_fill(&src, 4 * KB, KB, FillKind::Zero, false).unwrap();

        let err = backend
            .copy(&src, &temp_dir.path().join("b.out"), KB, AccessPattern::RandomSingleBlock, false)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_copy_empty_source() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("empty.out");
        std::fs::write(&src, b"").unwrap();
        let mut backend = backend();

        for order in [AccessPattern::Sequential, AccessPattern::Converging] {
            let dst = temp_dir.path().join(format!("empty_{}.out", order));
            assert_eq!(backend.copy(&src, &dst, KB, order, false).unwrap(), 0);
            assert_eq!(std::fs::metadata(&dst).unwrap().len(), 0);
        }
    }

    #[test]
    fn test_read_random_block() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("zero_1.out");
        let mut backend = backend();
        backend.write_fill(&path, 10 * KB, 32 * KB, FillKind::Zero, false).unwrap();

        assert_eq!(backend.read_random_block(&path, 8 * KB).unwrap(), 8 * KB);
        assert!(backend.read_random_block(&path, 128 * KB).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_read_sweep_all_orders() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sweep.out");
        let mut backend = backend();
        backend.write_fill(&path, 10 * KB, 32 * KB, FillKind::Zero, false).unwrap();

        for order in [AccessPattern::Sequential, AccessPattern::RandomShuffle, AccessPattern::Converging] {
            assert_eq!(backend.read_sweep(&path, 8 * KB, order).unwrap(), 10 * KB);
            assert_eq!(backend.read_sweep(&path, 128 * KB, order).unwrap(), 10 * KB);
        }
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = backend()
            .read_sweep(&temp_dir.path().join("nope"), KB, AccessPattern::Sequential)
            .unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("x.out");
        let err = backend().write_fill(&path, KB, 0, FillKind::Zero, false).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
