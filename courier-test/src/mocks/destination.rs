#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use ethers::core::types::U256;

use courier_core::*;

mock! {
    pub DestinationChain {
        pub fn _simulate(
            &self,
            payload: &JobPayload,
            gas_allowance: u64,
        ) -> Result<Simulation, ChainCommunicationError> {}

        pub fn _gas_price(&self) -> Result<U256, ChainCommunicationError> {}
    }
}

impl std::fmt::Debug for MockDestinationChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockDestinationChain")
    }
}

#[async_trait]
impl DestinationClient for MockDestinationChain {
    fn name(&self) -> &str {
        "mock"
    }

    async fn simulate(
        &self,
        payload: &JobPayload,
        gas_allowance: u64,
    ) -> Result<Simulation, ChainCommunicationError> {
        self._simulate(payload, gas_allowance)
    }

    async fn gas_price(&self) -> Result<U256, ChainCommunicationError> {
        self._gas_price()
    }
}
