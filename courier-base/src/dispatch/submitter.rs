use courier_configuration::{apply_bps, RetryConfig, BPS_DENOMINATOR};
use courier_core::{ChainCommunicationError, DispatchRequest, JobPayload, TxOutcome, TxSubmitter};
use ethers::core::types::U256;
use prometheus::IntCounter;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::DispatchError;

/// Submits dispatch transactions, retrying fee-too-low and used-nonce
/// rejections a bounded number of times
#[derive(Debug)]
pub struct RetryingSubmitter<S> {
    submitter: Arc<S>,
    config: RetryConfig,
    retries: Option<IntCounter>,
}

impl<S> RetryingSubmitter<S>
where
    S: TxSubmitter,
{
    /// Instantiate a new retrying submitter
    pub fn new(submitter: Arc<S>, config: RetryConfig) -> Self {
        Self {
            submitter,
            config,
            retries: None,
        }
    }

    /// Count retries on `counter`
    pub fn with_retry_counter(mut self, counter: IntCounter) -> Self {
        self.retries = Some(counter);
        self
    }

    fn bumped(&self, price: U256) -> U256 {
        let bumped = apply_bps(price, BPS_DENOMINATOR + self.config.price_bump_bps);
        // a zero bump would resubmit the rejected price
        bumped.max(price.saturating_add(U256::one()))
    }

    /// Submit `payload` with `fee` attached
    #[instrument(err, skip(self, payload), fields(job = %payload.job_id()))]
    pub async fn submit(
        &self,
        destination: u32,
        payload: &JobPayload,
        fee: U256,
    ) -> Result<TxOutcome, DispatchError> {
        let mut request = DispatchRequest {
            destination,
            payload: payload.clone(),
            fee,
            tx_gas_price: self.submitter.gas_price().await?,
            nonce: self.submitter.next_nonce().await?,
        };

        let mut attempt = 1;
        loop {
            let err = match self.submitter.submit(&request).await {
                Ok(outcome) => {
                    info!(attempt, txid = ?outcome.txid, "Submitted dispatch");
                    return Ok(outcome);
                }
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e.into()),
            };

            if attempt >= self.config.max_attempts {
                return Err(DispatchError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            if let ChainCommunicationError::NonceUsed(_) = err {
                request.nonce = self.submitter.next_nonce().await?;
            } else {
                request.tx_gas_price = self.bumped(request.tx_gas_price);
            }
            warn!(
                attempt,
                error = %err,
                gas_price = %request.tx_gas_price,
                nonce = %request.nonce,
                "Retrying dispatch submission"
            );
            if let Some(counter) = &self.retries {
                counter.inc();
            }

            sleep(self.config.backoff()).await;
            attempt += 1;
        }
    }
}
