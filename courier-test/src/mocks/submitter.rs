#![allow(non_snake_case)]

use async_trait::async_trait;
use mockall::*;

use ethers::core::types::U256;

use courier_core::*;

mock! {
    pub Submitter {
        pub fn _next_nonce(&self) -> Result<U256, ChainCommunicationError> {}

        pub fn _gas_price(&self) -> Result<U256, ChainCommunicationError> {}

        pub fn _submit(&self, request: &DispatchRequest) -> Result<TxOutcome, ChainCommunicationError> {}
    }
}

impl std::fmt::Debug for MockSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MockSubmitter")
    }
}

#[async_trait]
impl TxSubmitter for MockSubmitter {
    async fn next_nonce(&self) -> Result<U256, ChainCommunicationError> {
        self._next_nonce()
    }

    async fn gas_price(&self) -> Result<U256, ChainCommunicationError> {
        self._gas_price()
    }

    async fn submit(&self, request: &DispatchRequest) -> Result<TxOutcome, ChainCommunicationError> {
        self._submit(request)
    }
}
