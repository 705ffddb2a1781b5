//! Random-shuffle order
//!
//! Visits every offset of the block map exactly once, in a uniformly random
//! permutation. The shuffle is Fisher-Yates via `SliceRandom::shuffle`, so
//! every permutation is equally likely given an unbiased generator.

use super::block_map::BlockMap;
use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffled traversal of a block map
#[derive(Debug)]
pub struct ShuffleOrder {
    offsets: std::vec::IntoIter<u64>,
}

impl ShuffleOrder {
    pub fn new<R: Rng + ?Sized>(map: BlockMap, rng: &mut R) -> Self {
        let mut offsets = map.into_offsets();
        offsets.shuffle(rng);
        Self {
            offsets: offsets.into_iter(),
        }
    }
}

impl Iterator for ShuffleOrder {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        self.offsets.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

impl ExactSizeIterator for ShuffleOrder {}
