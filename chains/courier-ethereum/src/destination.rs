use async_trait::async_trait;
use courier_core::{ChainCommunicationError, DestinationClient, JobPayload, Simulation};
use ethers::{
    core::types::{transaction::eip2718::TypedTransaction, Address, TransactionRequest, U256},
    providers::Middleware,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    error::{classify, Rejection},
    EthereumError,
};

/// Destination chain access over an ethers middleware. Simulations are
/// `eth_estimateGas` calls of the job's effect, made as the executor that
/// would run it
#[derive(Debug)]
pub struct EthereumDestination<M> {
    name: String,
    provider: Arc<M>,
    executor: Address,
}

impl<M> EthereumDestination<M>
where
    M: Middleware,
{
    /// Instantiate a destination client. `executor` is the address the
    /// simulated effect is called from
    pub fn new(name: impl Into<String>, provider: Arc<M>, executor: Address) -> Self {
        Self {
            name: name.into(),
            provider,
            executor,
        }
    }

    fn simulation_tx(&self, payload: &JobPayload, gas_allowance: u64) -> TypedTransaction {
        TransactionRequest::new()
            .from(self.executor)
            .to(payload.target)
            .data(payload.data.clone())
            .gas(gas_allowance)
            .gas_price(payload.gas_price)
            .into()
    }
}

#[async_trait]
impl<M> DestinationClient for EthereumDestination<M>
where
    M: Middleware + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(err, skip(self, payload), fields(chain = %self.name, target = ?payload.target))]
    async fn simulate(
        &self,
        payload: &JobPayload,
        gas_allowance: u64,
    ) -> Result<Simulation, ChainCommunicationError> {
        let tx = self.simulation_tx(payload, gas_allowance);
        let used = match self.provider.estimate_gas(&tx, None).await {
            Ok(used) => used,
            Err(e) => {
                let message = e.to_string();
                return match classify(&message) {
                    Some(Rejection::OutOfGas) => Ok(Simulation { gas_left: 0 }),
                    _ => Err(ChainCommunicationError::SimulationReverted(message)),
                };
            }
        };

        let gas_left = U256::from(gas_allowance).saturating_sub(used);
        debug!(used = %used, gas_left = %gas_left, "Simulated job effect");
        Ok(Simulation {
            gas_left: gas_left.low_u64(),
        })
    }

    async fn gas_price(&self) -> Result<U256, ChainCommunicationError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| EthereumError::MiddlewareError(e.to_string()).into())
    }
}
