use ethers::core::types::H256;

use crate::{utils::keccak, ChainContext};

/// Destination chain whose clock moves only when told to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualClock {
    block: u64,
    timestamp: u64,
    block_time: u64,
}

impl ManualClock {
    /// Clock at `block` and `timestamp`, producing a block every
    /// `block_time` seconds
    pub fn new(block: u64, timestamp: u64, block_time: u64) -> Self {
        Self {
            block,
            timestamp,
            block_time: block_time.max(1),
        }
    }

    /// Move forward `seconds`, producing the blocks that fit in them
    pub fn advance(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
        self.block = self.block.saturating_add(seconds / self.block_time);
    }

    /// Produce a single block
    pub fn mine(&mut self) {
        self.advance(self.block_time);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1, 1_600_000_000, 12)
    }
}

impl ChainContext for ManualClock {
    fn block_number(&self) -> u64 {
        self.block
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn block_hash(&self, number: u64) -> H256 {
        keccak([b"block".as_ref(), number.to_be_bytes().as_ref()])
    }
}
