use ethers::core::types::H256;

/// Destination chain state visible to the coordinator
pub trait ChainContext: std::fmt::Debug {
    /// Current block number
    fn block_number(&self) -> u64;

    /// Current block timestamp, in seconds
    fn timestamp(&self) -> u64;

    /// Hash of a past block
    fn block_hash(&self, number: u64) -> H256;

    /// Hash of the block before the current one, or of the current block at
    /// genesis
    fn recent_block_hash(&self) -> H256 {
        self.block_hash(self.block_number().saturating_sub(1))
    }
}
