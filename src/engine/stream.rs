//! Stream backend
//!
//! Portable backend built on `std::fs::File` handles: every positioned
//! access is a `seek` followed by `read`/`write` on the handle, and
//! durability uses `File::sync_all`. It works wherever the standard library
//! does, including platforms without raw descriptor control.

use super::primitives::{self, PositionedIo};
use super::{AccessPattern, BackendCapabilities, FillKind, IoBackend};
use crate::error::DrillResult;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

struct HandleIo;

impl PositionedIo for HandleIo {
    fn read_at(&self, file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut handle = file;
        handle.seek(SeekFrom::Start(offset))?;

        let mut total = 0;
        while total < buf.len() {
            match handle.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    fn write_all_at(&self, file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
        let mut handle = file;
        handle.seek(SeekFrom::Start(offset))?;
        handle.write_all(buf)
    }

    fn sync_data(&self, file: &File) -> io::Result<()> {
        file.sync_all()
    }
}

/// Handle-based backend
pub struct StreamBackend {
    io: HandleIo,
    rng: Xoshiro256PlusPlus,
}

impl StreamBackend {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        Self { io: HandleIo, rng }
    }
}

impl Default for StreamBackend {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IoBackend for StreamBackend {
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
            name: "stream",
            raw_descriptors: false,
            positioned_io: false,
        }
    }
}
