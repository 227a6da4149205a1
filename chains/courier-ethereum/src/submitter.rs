use async_trait::async_trait;
use courier_core::{ChainCommunicationError, DispatchRequest, Encode, TxOutcome, TxSubmitter};
use ethers::{
    abi::{self, Token},
    core::types::{
        transaction::eip2718::TypedTransaction, Address, BlockNumber, Bytes, TransactionRequest,
        U256,
    },
    providers::Middleware,
};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::EthereumError;

/// Signature of the source-side entry point that hands payloads to the
/// transport
pub const DISPATCH_SIGNATURE: &str = "dispatch(uint32,bytes)";

/// Calldata for dispatching `request` through the source contract
pub fn dispatch_calldata(request: &DispatchRequest) -> Bytes {
    let selector = ethers::utils::id(DISPATCH_SIGNATURE);
    let body = abi::encode(&[
        Token::Uint(request.destination.into()),
        Token::Bytes(request.payload.to_vec()),
    ]);
    [selector.as_slice(), body.as_slice()].concat().into()
}

/// Submits dispatch transactions from a single account through an ethers
/// middleware, which is expected to sign
#[derive(Debug)]
pub struct EthereumSubmitter<M> {
    provider: Arc<M>,
    sender: Address,
    dispatcher: Address,
}

impl<M> EthereumSubmitter<M>
where
    M: Middleware,
{
    /// Submit from `sender` to the source `dispatcher` contract
    pub fn new(provider: Arc<M>, sender: Address, dispatcher: Address) -> Self {
        Self {
            provider,
            sender,
            dispatcher,
        }
    }

    fn dispatch_tx(&self, request: &DispatchRequest) -> TypedTransaction {
        TransactionRequest::new()
            .from(self.sender)
            .to(self.dispatcher)
            .value(request.fee)
            .gas_price(request.tx_gas_price)
            .nonce(request.nonce)
            .data(dispatch_calldata(request))
            .into()
    }
}

fn middleware_error(e: impl std::error::Error) -> ChainCommunicationError {
    EthereumError::MiddlewareError(e.to_string()).into()
}

#[async_trait]
impl<M> TxSubmitter for EthereumSubmitter<M>
where
    M: Middleware + 'static,
{
    async fn next_nonce(&self) -> Result<U256, ChainCommunicationError> {
        self.provider
            .get_transaction_count(self.sender, Some(BlockNumber::Pending.into()))
            .await
            .map_err(middleware_error)
    }

    async fn gas_price(&self) -> Result<U256, ChainCommunicationError> {
        self.provider.get_gas_price().await.map_err(middleware_error)
    }

    #[instrument(err, skip(self, request), fields(job = %request.payload.job_id(), nonce = %request.nonce))]
    async fn submit(&self, request: &DispatchRequest) -> Result<TxOutcome, ChainCommunicationError> {
        let tx = self.dispatch_tx(request);
        log_tx_details!(tx);

        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(middleware_error)?;
        let tx_hash = *pending;
        let receipt = pending
            .await
            .map_err(|e| ChainCommunicationError::from(EthereumError::ProviderError(e)))?
            .ok_or_else(|| {
                ChainCommunicationError::CustomError(Box::new(EthereumError::DroppedError(
                    tx_hash,
                )))
            })?;

        info!(
            "confirmed transaction with tx_hash {:?}",
            receipt.transaction_hash
        );
        receipt.try_into()
    }
}

#[cfg(test)]
mod test {
    use courier_core::JobPayload;
    use ethers::providers::Provider;

    use super::*;

    fn request() -> DispatchRequest {
        DispatchRequest {
            destination: 137,
            payload: JobPayload {
                source_chain: 1,
                target: Address::repeat_byte(0xaa),
                nonce: U256::one(),
                data: vec![0x01].into(),
                gas_limit: 100_000,
                gas_price: U256::from(30),
            },
            fee: U256::from(1_000),
            tx_gas_price: U256::from(20),
            nonce: U256::from(4),
        }
    }

    #[test]
    fn calldata_wraps_the_canonical_payload() {
        let request = request();
        let calldata = dispatch_calldata(&request);
        assert_eq!(&calldata[..4], &ethers::utils::id(DISPATCH_SIGNATURE));

        let tokens = abi::decode(
            &[abi::ParamType::Uint(32), abi::ParamType::Bytes],
            &calldata[4..],
        )
        .unwrap();
        assert_eq!(tokens[0], Token::Uint(U256::from(137u32)));
        assert_eq!(tokens[1], Token::Bytes(request.payload.to_vec()));
    }

    #[test]
    fn dispatch_transactions_carry_fee_price_and_nonce() {
        let (provider, _) = Provider::mocked();
        let submitter = EthereumSubmitter::new(
            Arc::new(provider),
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
        );

        let tx = submitter.dispatch_tx(&request());
        assert_eq!(tx.value(), Some(&U256::from(1_000)));
        assert_eq!(tx.gas_price(), Some(U256::from(20)));
        assert_eq!(tx.nonce(), Some(&U256::from(4)));
        assert_eq!(tx.from(), Some(&Address::repeat_byte(0x01)));
    }

    #[tokio::test]
    async fn it_reads_the_pending_nonce() {
        let (provider, mock) = Provider::mocked();
        mock.push(U256::from(12)).unwrap();

        let submitter =
            EthereumSubmitter::new(Arc::new(provider), Address::zero(), Address::zero());
        assert_eq!(submitter.next_nonce().await.unwrap(), U256::from(12));
    }
}
