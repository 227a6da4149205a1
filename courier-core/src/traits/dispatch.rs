use async_trait::async_trait;
use ethers::{
    core::types::{TransactionReceipt, H256, U256},
    providers::ProviderError,
};
use std::error::Error as StdError;

use crate::JobPayload;

/// The result of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    /// The txid
    pub txid: H256,
}

impl TryFrom<TransactionReceipt> for TxOutcome {
    type Error = ChainCommunicationError;

    fn try_from(t: TransactionReceipt) -> Result<Self, Self::Error> {
        match t.status.map(|s| s.low_u32()) {
            Some(1) => Ok(Self {
                txid: t.transaction_hash,
            }),
            _ => Err(ChainCommunicationError::NotExecuted(t.transaction_hash)),
        }
    }
}

/// ChainCommunicationError contains errors returned when attempting to
/// call a chain or dispatch a transaction
#[derive(Debug, thiserror::Error)]
pub enum ChainCommunicationError {
    /// Provider Error
    #[error("{0}")]
    ProviderError(#[from] ProviderError),
    /// Offered gas price was rejected as too low
    #[error("Fee too low: {0}")]
    FeeTooLow(String),
    /// Nonce was already consumed
    #[error("Nonce already used: {0}")]
    NonceUsed(String),
    /// Simulation reverted for a reason unrelated to gas
    #[error("Simulation reverted: {0}")]
    SimulationReverted(String),
    /// A transaction was not executed successfully
    #[error("Transaction was not executed successfully {0:?}")]
    NotExecuted(H256),
    /// Any other error
    #[error("{0}")]
    CustomError(#[from] Box<dyn StdError + Send + Sync>),
}

impl ChainCommunicationError {
    /// Whether a fresh attempt with adjusted parameters may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ChainCommunicationError::FeeTooLow(_) | ChainCommunicationError::NonceUsed(_)
        )
    }
}

/// Outcome of simulating a payload on the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
    /// Gas remaining out of the supplied allowance
    pub gas_left: u64,
}

/// Quoted cost of dispatching a payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeQuote {
    /// Protocol service fee
    pub service_fee: U256,
    /// Transport fee
    pub transport_fee: U256,
}

impl FeeQuote {
    /// Service plus transport fee
    pub fn total(&self) -> U256 {
        self.service_fee.saturating_add(self.transport_fee)
    }
}

/// A payload ready to be submitted on the source chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    /// Destination chain id
    pub destination: u32,
    /// Payload carrying the final gas parameters
    pub payload: JobPayload,
    /// Value attached to cover service and transport fees
    pub fee: U256,
    /// Source transaction gas price
    pub tx_gas_price: U256,
    /// Source transaction nonce
    pub nonce: U256,
}

/// Read access to the destination chain used for estimation
#[async_trait]
pub trait DestinationClient: Send + Sync + std::fmt::Debug {
    /// Chain name, used for config lookup and logs
    fn name(&self) -> &str;

    /// Simulate executing `payload` with `gas_allowance` gas
    async fn simulate(
        &self,
        payload: &JobPayload,
        gas_allowance: u64,
    ) -> Result<Simulation, ChainCommunicationError>;

    /// Currently observed gas price
    async fn gas_price(&self) -> Result<U256, ChainCommunicationError>;
}

/// Fee quotes from the protocol and the transport
#[async_trait]
pub trait FeeQuoter: Send + Sync + std::fmt::Debug {
    /// Quote the service and transport fee for a payload
    async fn estimate_fee(
        &self,
        destination: u32,
        gas_limit: u64,
        gas_price: U256,
        payload: &JobPayload,
    ) -> Result<FeeQuote, ChainCommunicationError>;
}

/// Source-chain transaction submission
#[async_trait]
pub trait TxSubmitter: Send + Sync + std::fmt::Debug {
    /// Next usable nonce of the submitting account
    async fn next_nonce(&self) -> Result<U256, ChainCommunicationError>;

    /// Current source chain gas price
    async fn gas_price(&self) -> Result<U256, ChainCommunicationError>;

    /// Submit the dispatch transaction
    async fn submit(&self, request: &DispatchRequest) -> Result<TxOutcome, ChainCommunicationError>;
}
