//! Access patterns
//!
//! This module turns a file's block map into the sequence of offsets a
//! primitive visits during one pass. Four orders are supported:
//!
//! - **Sequential**: ascending offsets
//! - **RandomShuffle**: uniformly random permutation, each offset exactly once
//! - **Converging**: alternating ends toward the middle
//! - **RandomSingleBlock**: one uniformly random block, no map required
//!
//! # Passes
//!
//! A [`PatternIter`] is finite and consumed once. Every pass builds a new one
//! from a freshly computed [`BlockMap`], so a file that changed size since
//! the previous pass is traversed with its current geometry.
//!
//! # Example
//!
//! ```
//! use fsdrill::pattern::{AccessPattern, PatternIter, block_map::compute_block_map};
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
//! let map = compute_block_map(4, 1).unwrap();
//! let order: Vec<u64> = PatternIter::new(map, AccessPattern::Converging, &mut rng)
//!     .unwrap()
//!     .collect();
//! assert_eq!(order, vec![0, 3, 1, 2]);
//! ```

pub mod block_map;
pub mod converging;
pub mod sequential;
pub mod shuffle;
pub mod single_block;

use crate::error::DrillResult;
use block_map::BlockMap;
use converging::ConvergingOrder;
use rand::Rng;
use sequential::SequentialOrder;
use serde::{Deserialize, Serialize};
use shuffle::ShuffleOrder;
use std::fmt;

/// Traversal order for a pass over one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessPattern {
    Sequential,
    RandomShuffle,
    Converging,
    RandomSingleBlock,
}

impl Default for AccessPattern {
    fn default() -> Self {
        Self::Sequential
    }
}

impl AccessPattern {
    /// Whether the pattern walks a full block map
    pub fn is_map_based(&self) -> bool {
        !matches!(self, AccessPattern::RandomSingleBlock)
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessPattern::Sequential => write!(f, "sequential"),
            AccessPattern::RandomShuffle => write!(f, "random-shuffle"),
            AccessPattern::Converging => write!(f, "converging"),
            AccessPattern::RandomSingleBlock => write!(f, "random-single-block"),
        }
    }
}

/// Offsets of one pass, in the order chosen by an [`AccessPattern`]
#[derive(Debug)]
pub enum PatternIter {
    Sequential(SequentialOrder),
    Shuffle(ShuffleOrder),
    Converging(ConvergingOrder),
    /// Holds the one sampled offset until it is taken
    SingleBlock(Option<u64>),
}

impl PatternIter {
    /// Build the iterator for one pass
    ///
    /// For `RandomSingleBlock` the map is used only for its file and block
    /// size; the iterator yields exactly one offset.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for `RandomSingleBlock` when the block does not fit
    /// in the file.
    pub fn new<R: Rng + ?Sized>(
        map: BlockMap,
        pattern: AccessPattern,
        rng: &mut R,
    ) -> DrillResult<Self> {
        let iter = match pattern {
            AccessPattern::Sequential => PatternIter::Sequential(SequentialOrder::new(map)),
            AccessPattern::RandomShuffle => PatternIter::Shuffle(ShuffleOrder::new(map, rng)),
            AccessPattern::Converging => PatternIter::Converging(ConvergingOrder::new(map)),
            AccessPattern::RandomSingleBlock => {
                let offset = single_block::pick_single_block(map.file_size(), map.block_size(), rng)?;
                PatternIter::SingleBlock(Some(offset))
            }
        };
        Ok(iter)
    }

    /// Compute a fresh block map and build the iterator in one step
    ///
    /// `RandomSingleBlock` never builds a map.
    pub fn for_file<R: Rng + ?Sized>(
        file_size: u64,
        block_size: u64,
        pattern: AccessPattern,
        rng: &mut R,
    ) -> DrillResult<Self> {
        if pattern == AccessPattern::RandomSingleBlock {
            let offset = single_block::pick_single_block(file_size, block_size, rng)?;
            return Ok(PatternIter::SingleBlock(Some(offset)));
        }
        let map = block_map::compute_block_map(file_size, block_size)?;
        Self::new(map, pattern, rng)
    }
}

impl Iterator for PatternIter {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        match self {
            PatternIter::Sequential(it) => it.next(),
            PatternIter::Shuffle(it) => it.next(),
            PatternIter::Converging(it) => it.next(),
            PatternIter::SingleBlock(slot) => slot.take(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            PatternIter::Sequential(it) => it.size_hint(),
            PatternIter::Shuffle(it) => it.size_hint(),
            PatternIter::Converging(it) => it.size_hint(),
            PatternIter::SingleBlock(slot) => {
                let n = usize::from(slot.is_some());
                (n, Some(n))
            }
        }
    }
}

impl ExactSizeIterator for PatternIter {}
