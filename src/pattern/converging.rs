//! Converging order
//!
//! Alternates between the two ends of the block map and walks toward the
//! middle: first, last, second, second-to-last, ... When the map has an odd
//! number of blocks the middle block is visited last, from whichever side
//! reaches it.

use super::block_map::BlockMap;

/// Two-ended traversal of a block map
#[derive(Debug)]
pub struct ConvergingOrder {
    offsets: Vec<u64>,
    /// Next unvisited index from the front
    front: usize,
    /// One past the next unvisited index from the back
    back: usize,
    take_front: bool,
}

impl ConvergingOrder {
    pub fn new(map: BlockMap) -> Self {
        let offsets = map.into_offsets();
        let back = offsets.len();
        Self {
            offsets,
            front: 0,
            back,
            take_front: true,
        }
    }
}

impl Iterator for ConvergingOrder {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.front >= self.back {
            return None;
        }

        let offset = if self.take_front {
            let o = self.offsets[self.front];
            self.front += 1;
            o
        } else {
            self.back -= 1;
            self.offsets[self.back]
        };
        self.take_front = !self.take_front;

        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ConvergingOrder {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::block_map::compute_block_map;

    fn converge(blocks: u64) -> Vec<u64> {
        let map = compute_block_map(blocks, 1).unwrap();
        ConvergingOrder::new(map).collect()
    }

    #[test]
    fn test_converging_even_count() {
        assert_eq!(converge(4), vec![0, 3, 1, 2]);
    }

    #[test]
    fn test_converging_odd_count_middle_last() {
        assert_eq!(converge(5), vec![0, 4, 1, 3, 2]);
    }

    #[test]
    fn test_converging_small_maps() {
        assert_eq!(converge(0), Vec::<u64>::new());
        assert_eq!(converge(1), vec![0]);
        assert_eq!(converge(2), vec![0, 1]);
        assert_eq!(converge(3), vec![0, 2, 1]);
    }

    #[test]
    fn test_converging_no_skip_no_repeat() {
        for n in 0..200u64 {
            let mut order = converge(n);
            assert_eq!(order.len() as u64, n);
            order.sort_unstable();
            assert_eq!(order, (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_converging_byte_offsets() {
        let map = compute_block_map(5 * 1024 + 10, 1024).unwrap();
        let order: Vec<u64> = ConvergingOrder::new(map).collect();
        assert_eq!(order, vec![0, 5120, 1024, 4096, 2048, 3072]);
    }

    #[test]
    fn test_converging_size_hint_tracks_progress() {
        let mut it = ConvergingOrder::new(compute_block_map(6, 1).unwrap());
        assert_eq!(it.len(), 6);
        it.next();
        it.next();
        assert_eq!(it.len(), 4);
    }
}
