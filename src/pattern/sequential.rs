//! Sequential order
//!
//! Visits block offsets in ascending order: 0, bs, 2*bs, ...

use super::block_map::BlockMap;

/// Ascending traversal of a block map
#[derive(Debug)]
pub struct SequentialOrder {
    offsets: std::vec::IntoIter<u64>,
}

impl SequentialOrder {
    pub fn new(map: BlockMap) -> Self {
        Self {
            offsets: map.into_offsets().into_iter(),
        }
    }
}

impl Iterator for SequentialOrder {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        self.offsets.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.offsets.size_hint()
    }
}

impl ExactSizeIterator for SequentialOrder {}
