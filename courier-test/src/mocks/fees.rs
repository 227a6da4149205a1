#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use ethers::core::types::U256;

use courier_core::*;

mock! {
    pub FeeOracle {
        pub fn _estimate_fee(
            &self,
            destination: u32,
            gas_limit: u64,
            gas_price: U256,
            payload: &JobPayload,
        ) -> Result<FeeQuote, ChainCommunicationError> {}
    }
}

impl std::fmt::Debug for MockFeeOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockFeeOracle")
    }
}

#[async_trait]
impl FeeQuoter for MockFeeOracle {
    async fn estimate_fee(
        &self,
        destination: u32,
        gas_limit: u64,
        gas_price: U256,
        payload: &JobPayload,
    ) -> Result<FeeQuote, ChainCommunicationError> {
        self._estimate_fee(destination, gas_limit, gas_price, payload)
    }
}
