//! Block buffers and fill content
//!
//! Write primitives pull block-sized byte slices from a [`BlockFiller`]. The
//! filler owns a single reusable buffer so the write loop does not allocate
//! per block.

use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content written by fill operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillKind {
    /// Null bytes
    Zero,
    /// One random block generated per file, repeated for every block
    ///
    /// Fast and low entropy; compressible and dedupable storage will notice.
    PseudoRandomRepeating,
    /// Fresh unpredictable bytes for every block
    Random,
}

impl Default for FillKind {
    fn default() -> Self {
        Self::Zero
    }
}

impl FillKind {
    /// Short name used for generated file names
    pub fn file_prefix(&self) -> &'static str {
        match self {
            FillKind::Zero => "zero",
            FillKind::PseudoRandomRepeating => "srandom",
            FillKind::Random => "random",
        }
    }
}

impl fmt::Display for FillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillKind::Zero => write!(f, "zero"),
            FillKind::PseudoRandomRepeating => write!(f, "pseudo-random-repeating"),
            FillKind::Random => write!(f, "random"),
        }
    }
}

/// Source of block content for one file
///
/// Create one filler per file: for `PseudoRandomRepeating` the repeated
/// block is captured at construction, so a new filler means new content.
pub struct BlockFiller {
    kind: FillKind,
    buf: Vec<u8>,
}

impl BlockFiller {
    pub fn new(kind: FillKind, block_size: usize) -> Self {
        let mut buf = vec![0u8; block_size];
        if kind == FillKind::PseudoRandomRepeating {
            Xoshiro256PlusPlus::from_entropy().fill_bytes(&mut buf);
        }
        Self { kind, buf }
    }

    pub fn kind(&self) -> FillKind {
        self.kind
    }

    pub fn block_size(&self) -> usize {
        self.buf.len()
    }

    /// Content for the next block of `len` bytes (`len <= block_size`)
    #[inline]
    pub fn next_block(&mut self, len: usize) -> &[u8] {
        debug_assert!(len <= self.buf.len());
        let len = len.min(self.buf.len());
        if self.kind == FillKind::Random {
            rand::thread_rng().fill_bytes(&mut self.buf[..len]);
        }
        &self.buf[..len]
    }
}

/// A freshly allocated block of unpredictable bytes
pub fn random_block(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill(buf.as_mut_slice());
    buf
}
