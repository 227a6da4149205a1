use courier_configuration::DispatchGasConfig;
use courier_core::{FeeQuoter, FeeQuote};
use ethers::core::types::U256;
use std::sync::Arc;

use crate::{DispatchError, GasEstimate};

/// A quoted fee and the margin-adjusted total attached to the dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    /// Raw quote
    pub quote: FeeQuote,
    /// Quote total with the fee margin applied
    pub total: U256,
}

/// Fee quoting with a safety margin
#[derive(Debug)]
pub struct FeeCalculator<Q> {
    quoter: Arc<Q>,
    config: DispatchGasConfig,
}

impl<Q> FeeCalculator<Q>
where
    Q: FeeQuoter,
{
    /// Calculator over `quoter` using the destination's gas config
    pub fn new(quoter: Arc<Q>, config: DispatchGasConfig) -> Self {
        Self { quoter, config }
    }

    /// Quote the fee for an estimated payload
    pub async fn quote(
        &self,
        destination: u32,
        estimate: &GasEstimate,
    ) -> Result<FeeEstimate, DispatchError> {
        let quote = self
            .quoter
            .estimate_fee(
                destination,
                estimate.gas_limit,
                estimate.gas_price,
                &estimate.payload,
            )
            .await?;
        Ok(FeeEstimate {
            quote,
            total: self.config.fee_with_margin(quote.total()),
        })
    }
}

#[cfg(test)]
mod test {
    use courier_configuration::EVM_DEFAULT;
    use courier_core::JobPayload;
    use courier_test::mocks::MockFeeOracle;
    use ethers::core::types::Address;

    use super::*;

    #[tokio::test]
    async fn it_applies_the_margin_to_the_total() {
        let payload = JobPayload {
            source_chain: 1,
            target: Address::zero(),
            nonce: U256::zero(),
            data: Default::default(),
            gas_limit: 110_000,
            gas_price: U256::from(15),
        };
        let estimate = GasEstimate {
            gas_limit: 110_000,
            gas_price: U256::from(15),
            payload,
        };

        let mut oracle = MockFeeOracle::new();
        oracle
            .expect__estimate_fee()
            .withf(|destination, gas_limit, gas_price, _| {
                *destination == 137 && *gas_limit == 110_000 && *gas_price == U256::from(15)
            })
            .times(1)
            .returning(|_, _, _, _| {
                Ok(FeeQuote {
                    service_fee: U256::from(600),
                    transport_fee: U256::from(200),
                })
            });

        let fee = FeeCalculator::new(Arc::new(oracle), EVM_DEFAULT)
            .quote(137, &estimate)
            .await
            .unwrap();
        assert_eq!(fee.quote.total(), U256::from(800));
        assert_eq!(fee.total, U256::from(1_000));
    }
}
