//! Selection entropy derived from chain state.
//!
//! `seed = keccak(jobId ‖ recentBlockHash ‖ tweak)`. A validator able to
//! reorder or withhold blocks can predict and steer the outcome; selection
//! only needs to be uniform for honest block production.

use courier_types::JobId;
use ethers::core::types::{H256, U256};

use crate::utils::keccak;

/// Tweak of the primary selection
pub const PRIMARY_TWEAK: u64 = 0;

/// Tweak of the pod selection
pub const POD_TWEAK: u64 = u64::MAX;

/// Tweak of fallback position `k` (0-based)
pub fn fallback_tweak(k: usize) -> u64 {
    k as u64 + 1
}

/// Seed for a single draw
pub fn seed(job: &JobId, block_hash: &H256, tweak: u64) -> U256 {
    let digest = keccak([
        job.as_bytes(),
        block_hash.as_bytes(),
        tweak.to_be_bytes().as_ref(),
    ]);
    U256::from_big_endian(digest.as_bytes())
}

/// Reduce a seed to an index below `len`. `len` must be non-zero
pub fn pick(seed: U256, len: usize) -> usize {
    (seed % U256::from(len)).as_usize()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tweaks_separate_draws() {
        let job = JobId::from([7u8; 32]);
        let hash = H256::repeat_byte(3);
        let primary = seed(&job, &hash, PRIMARY_TWEAK);
        assert_eq!(primary, seed(&job, &hash, PRIMARY_TWEAK));
        assert_ne!(primary, seed(&job, &hash, fallback_tweak(0)));
        assert_ne!(primary, seed(&job, &H256::repeat_byte(4), PRIMARY_TWEAK));
    }

    #[test]
    fn picks_stay_in_range() {
        let job = JobId::from([1u8; 32]);
        for tweak in 0..64 {
            let s = seed(&job, &H256::zero(), tweak);
            assert!(pick(s, 5) < 5);
            assert_eq!(pick(s, 1), 0);
        }
    }
}
