//! Single random block selection
//!
//! Unlike the other orders this does not build a block map. It samples one
//! byte offset uniformly from `[0, file_size - block_size]`, so the chosen
//! block is always fully inside the file. Offsets are not aligned to the
//! block size.

use crate::error::{DrillError, DrillResult};
use rand::Rng;

/// Pick the start of one block uniformly at random
///
/// # Errors
///
/// `InvalidArgument` when `block_size` is zero or larger than `file_size`.
#[inline]
pub fn pick_single_block<R: Rng + ?Sized>(
    file_size: u64,
    block_size: u64,
    rng: &mut R,
) -> DrillResult<u64> {
    if block_size == 0 {
        return Err(DrillError::invalid("block size must be greater than 0"));
    }
    if block_size > file_size {
        return Err(DrillError::invalid(format!(
            "block size {} is greater than file size {}",
            block_size, file_size
        )));
    }

    Ok(rng.gen_range(0..=file_size - block_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_single_block_in_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        for _ in 0..1000 {
            let offset = pick_single_block(32 * 1024, 8 * 1024, &mut rng).unwrap();
            assert!(offset <= 24 * 1024);
        }
    }

    #[test]
    fn test_single_block_exact_fit() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        assert_eq!(pick_single_block(4096, 4096, &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_single_block_too_large() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let err = pick_single_block(32 * 1024, 128 * 1024, &mut rng).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_single_block_zero_block_size() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        assert!(pick_single_block(100, 0, &mut rng).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_single_block_coverage() {
        // Window of 10 possible offsets, each should be hit roughly 1/10 of the time
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let mut buckets = vec![0u32; 10];
        for _ in 0..10_000 {
            let offset = pick_single_block(19, 10, &mut rng).unwrap();
            buckets[offset as usize] += 1;
        }
        for count in buckets {
            assert!(count > 800 && count < 1200, "Bucket count {} outside expected range", count);
        }
    }
}
