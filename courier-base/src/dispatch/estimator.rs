use courier_configuration::DispatchGasConfig;
use courier_core::{DestinationClient, JobPayload};
use ethers::core::types::U256;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::DispatchError;

/// Gas parameters for a payload, and the payload embedding them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimate {
    /// Padded gas limit from the refined simulation
    pub gas_limit: u64,
    /// Destination gas price after multiplier and floor
    pub gas_price: U256,
    /// Payload carrying `gas_limit` and `gas_price`
    pub payload: JobPayload,
}

/// Two-pass destination gas estimation
#[derive(Debug)]
pub struct GasEstimator<D> {
    client: Arc<D>,
    config: DispatchGasConfig,
}

impl<D> GasEstimator<D>
where
    D: DestinationClient,
{
    /// Estimator over `client` using the chain's gas config
    pub fn new(client: Arc<D>, config: DispatchGasConfig) -> Self {
        Self { client, config }
    }

    async fn used_gas(&self, payload: &JobPayload, allowance: u64) -> Result<u64, DispatchError> {
        let simulation = self.client.simulate(payload, allowance).await?;
        if simulation.gas_left == 0 {
            return Err(DispatchError::AllowanceExhausted {
                chain: self.client.name().to_owned(),
                allowance,
            });
        }
        Ok(allowance.saturating_sub(simulation.gas_left))
    }

    /// Estimate gas limit and price for `draft`, whatever gas parameters it
    /// currently embeds
    #[instrument(err, skip(self, draft), fields(chain = self.client.name()))]
    pub async fn estimate(&self, draft: JobPayload) -> Result<GasEstimate, DispatchError> {
        let allowance = self.config.simulation_allowance;
        let observed = self.client.gas_price().await?;
        let gas_price = self.config.destination_price(observed);

        let trial = draft.with_gas(allowance, gas_price);
        let trial_used = self.used_gas(&trial, allowance).await?;
        let padded = self.config.padded_gas(trial_used);

        // gas parameters are part of the payload, so re-simulate with them
        // embedded, under the full allowance
        let refined = trial.with_gas(padded, gas_price);
        let used = self.used_gas(&refined, allowance).await?;
        let gas_limit = self.config.padded_gas(used);

        debug!(
            observed = %observed,
            gas_price = %gas_price,
            trial_used,
            used,
            gas_limit,
            "Estimated destination gas"
        );
        Ok(GasEstimate {
            gas_limit,
            gas_price,
            payload: refined.with_gas(gas_limit, gas_price),
        })
    }
}
