//! Block map computation
//!
//! A block map partitions a file of `file_size` bytes into `block_size`
//! chunks and records the byte offset of each chunk. The final chunk is
//! shorter when the file size is not a multiple of the block size.
//!
//! This is a pure function of its two inputs. Callers recompute it before
//! every pass because files can change size between passes.
//!
//! # Example
//!
//! ```
//! use fsdrill::pattern::block_map::compute_block_map;
//!
//! let map = compute_block_map(10_000, 4096).unwrap();
//! assert_eq!(map.offsets(), &[0, 4096, 8192]);
//! assert_eq!(map.block_len(8192), 10_000 - 8192);
//! ```

use crate::error::{DrillError, DrillResult};

/// Ordered offsets covering `[0, file_size)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMap {
    file_size: u64,
    block_size: u64,
    offsets: Vec<u64>,
}

impl BlockMap {
    /// Offsets in ascending order
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Consume the map, returning the offsets
    pub fn into_offsets(self) -> Vec<u64> {
        self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn block_size(&self) -> u64 {
        self.block_size
    }

    /// Length of the block starting at `offset`
    ///
    /// Equal to the block size except for the tail block. Returns 0 for
    /// offsets at or beyond the end of the file.
    #[inline]
    pub fn block_len(&self, offset: u64) -> u64 {
        self.file_size.saturating_sub(offset).min(self.block_size)
    }
}

/// Compute the block map for a file
///
/// # Errors
///
/// `InvalidArgument` if `block_size` is zero.
pub fn compute_block_map(file_size: u64, block_size: u64) -> DrillResult<BlockMap> {
    if block_size == 0 {
        return Err(DrillError::invalid("block size must be greater than 0"));
    }

    let count = file_size.div_ceil(block_size);
    let offsets = (0..count).map(|i| i * block_size).collect();

    Ok(BlockMap {
        file_size,
        block_size,
        offsets,
    })
}
