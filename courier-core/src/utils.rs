use ethers::core::types::H256;
use sha3::{Digest, Keccak256};

/// keccak256 of the concatenation of `parts`
pub fn keccak<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> H256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    H256::from_slice(hasher.finalize().as_slice())
}
