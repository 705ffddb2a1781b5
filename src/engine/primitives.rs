//! Primitive algorithms shared by the file-backed backends
//!
//! The sync and stream backends differ only in how they move bytes at an
//! offset and how they force data to storage. Everything else (argument
//! checks, open modes, traversal, copy size accounting) lives here so both
//! backends follow the same contract.

use super::{ensure_distinct, resolve_destination, AccessPattern, FillKind};
use crate::error::{DrillError, DrillResult, IoContext};
use crate::pattern::{single_block::pick_single_block, PatternIter};
use crate::util::buffer::{random_block, BlockFiller};
use rand::Rng;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Offset-addressed IO on an open file
pub(crate) trait PositionedIo {
    /// Read into `buf` at `offset` until it is full or EOF is reached
    ///
    /// Returns the number of bytes read; less than `buf.len()` only at EOF.
    fn read_at(&self, file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Write all of `buf` at `offset`
    fn write_all_at(&self, file: &File, buf: &[u8], offset: u64) -> io::Result<()>;

    /// Force written data to stable storage
    fn sync_data(&self, file: &File) -> io::Result<()>;
}

fn check_block_size(block_size: u64) -> DrillResult<usize> {
    if block_size == 0 {
        return Err(DrillError::invalid("block size must be greater than 0"));
    }
    usize::try_from(block_size)
        .map_err(|_| DrillError::invalid(format!("block size {} does not fit in memory", block_size)))
}

pub(crate) fn write_fill<P: PositionedIo>(
    io: &P,
    path: &Path,
    size: u64,
    block_size: u64,
    fill: FillKind,
    durable: bool,
) -> DrillResult<u64> {
    let bs = check_block_size(block_size)?;

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .io_context("create", path)?;

    // Never allocate more than the file needs
    let buf_len = bs.min(usize::try_from(size).unwrap_or(bs)).max(1);
    let mut filler = BlockFiller::new(fill, buf_len);

    let mut offset = 0u64;
    while offset < size {
        let len = (size - offset).min(buf_len as u64) as usize;
        io.write_all_at(&file, filler.next_block(len), offset)
            .io_context("write", path)?;
        offset += len as u64;
    }

    if durable {
        io.sync_data(&file).io_context("fsync", path)?;
    }

    Ok(size)
}

/// Overwrite one random block in place
///
/// The file is opened without `O_TRUNC`: the offset is drawn from the size
/// seen through the open handle, and the rest of the file keeps its bytes
/// and its length. Truncating first would leave a hole-filled file ending at
/// `offset + block_size`.
pub(crate) fn write_random_block<P: PositionedIo, R: Rng + ?Sized>(
    io: &P,
    rng: &mut R,
    path: &Path,
    block_size: u64,
    durable: bool,
) -> DrillResult<u64> {
    let bs = check_block_size(block_size)?;

    let file = OpenOptions::new()
        .write(true)
        .open(path)
        .io_context("open", path)?;
    let size = file.metadata().io_context("stat", path)?.len();
    let offset = pick_single_block(size, block_size, rng)?;

    let data = random_block(bs);
    io.write_all_at(&file, &data, offset).io_context("write", path)?;

    if durable {
        io.sync_data(&file).io_context("fsync", path)?;
    }

    Ok(block_size)
}

pub(crate) fn copy<P: PositionedIo, R: Rng + ?Sized>(
    io: &P,
    rng: &mut R,
    src: &Path,
    dst: &Path,
    block_size: u64,
    order: AccessPattern,
    durable: bool,
) -> DrillResult<u64> {
    let bs = check_block_size(block_size)?;
    if !order.is_map_based() {
        return Err(DrillError::invalid(format!("copy does not support the {} order", order)));
    }

    let dst = resolve_destination(src, dst);
    ensure_distinct(src, &dst)?;

    let fsrc = File::open(src).io_context("open", src)?;
    let fdst = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&dst)
        .io_context("create", &dst)?;

    let mut buf = vec![0u8; bs];
    let copied = match order {
        AccessPattern::Sequential => {
            // Stream until EOF; the source size is never consulted
            let mut offset = 0u64;
            loop {
                let n = io.read_at(&fsrc, &mut buf, offset).io_context("read", src)?;
                if n == 0 {
                    break;
                }
                io.write_all_at(&fdst, &buf[..n], offset).io_context("write", &dst)?;
                offset += n as u64;
            }
            offset
        }
        _ => {
            let size = fsrc.metadata().io_context("stat", src)?.len();
            let mut total = 0u64;

            for offset in PatternIter::for_file(size, block_size, order, rng)? {
                let len = (size - offset).min(block_size) as usize;
                let n = io.read_at(&fsrc, &mut buf[..len], offset).io_context("read", src)?;
                if n < len {
                    return Err(DrillError::io_other(
                        format!("copy failed: {}", src.display()),
                        format!("short read at offset {} ({} of {} bytes), source shrank during copy", offset, n, len),
                    ));
                }
                io.write_all_at(&fdst, &buf[..n], offset).io_context("write", &dst)?;
                total += n as u64;
            }

            if total != size {
                return Err(DrillError::io_other(
                    format!("copy failed: {}", src.display()),
                    format!("copied {} of {} bytes", total, size),
                ));
            }
            // Size the destination from the byte count, not from which block came last
            fdst.set_len(size).io_context("truncate", &dst)?;
            total
        }
    };

    if durable {
        io.sync_data(&fdst).io_context("fsync", &dst)?;
    }

    Ok(copied)
}

pub(crate) fn read_sweep<P: PositionedIo, R: Rng + ?Sized>(
    io: &P,
    rng: &mut R,
    path: &Path,
    block_size: u64,
    order: AccessPattern,
) -> DrillResult<u64> {
    if order == AccessPattern::RandomSingleBlock {
        return read_random_block(io, rng, path, block_size);
    }
    let bs = check_block_size(block_size)?;

    let file = File::open(path).io_context("open", path)?;
    let mut buf = vec![0u8; bs];

    let total = match order {
        AccessPattern::Sequential => {
            let mut offset = 0u64;
            loop {
                let n = io.read_at(&file, &mut buf, offset).io_context("read", path)?;
                if n == 0 {
                    break;
                }
                offset += n as u64;
            }
            offset
        }
        _ => {
            let size = file.metadata().io_context("stat", path)?.len();
            let mut total = 0u64;
            for offset in PatternIter::for_file(size, block_size, order, rng)? {
                let len = (size - offset).min(block_size) as usize;
                // A concurrent writer may have shrunk the file; short reads are fine here
                total += io.read_at(&file, &mut buf[..len], offset).io_context("read", path)? as u64;
            }
            total
        }
    };

    Ok(total)
}

pub(crate) fn read_random_block<P: PositionedIo, R: Rng + ?Sized>(
    io: &P,
    rng: &mut R,
    path: &Path,
    block_size: u64,
) -> DrillResult<u64> {
    let bs = check_block_size(block_size)?;

    let file = File::open(path).io_context("open", path)?;
    let size = file.metadata().io_context("stat", path)?.len();
    let offset = pick_single_block(size, block_size, rng)?;

    let mut buf = vec![0u8; bs];
    let n = io.read_at(&file, &mut buf, offset).io_context("read", path)?;

    Ok(n as u64)
}
