//! Client-side dispatch: gas estimation, fee quoting and bounded
//! submission retries

mod estimator;
mod fees;
mod submitter;

pub use estimator::*;
pub use fees::*;
pub use submitter::*;

use color_eyre::Result;
use courier_core::{DestinationClient, FeeQuoter, JobId, JobPayload, TxOutcome, TxSubmitter};
use tracing::{info, instrument};

/// Everything a completed dispatch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    /// Id of the payload that was submitted
    pub job_id: JobId,
    /// Gas parameters embedded in the payload
    pub estimate: GasEstimate,
    /// Fee attached to the submission
    pub fee: FeeEstimate,
    /// Source chain transaction
    pub outcome: TxOutcome,
}

/// Estimates, prices and submits payloads bound for one destination
#[derive(Debug)]
pub struct Dispatcher<D, Q, S> {
    destination: u32,
    estimator: GasEstimator<D>,
    fees: FeeCalculator<Q>,
    submitter: RetryingSubmitter<S>,
}

impl<D, Q, S> Dispatcher<D, Q, S>
where
    D: DestinationClient,
    Q: FeeQuoter,
    S: TxSubmitter,
{
    /// Assemble a dispatcher for `destination`
    pub fn new(
        destination: u32,
        estimator: GasEstimator<D>,
        fees: FeeCalculator<Q>,
        submitter: RetryingSubmitter<S>,
    ) -> Self {
        Self {
            destination,
            estimator,
            fees,
            submitter,
        }
    }

    /// Estimate gas, quote the fee and submit `payload`. The submitted
    /// payload carries the estimated gas parameters, so its id differs from
    /// the draft's
    #[instrument(err, skip(self, payload), fields(destination = self.destination, nonce = %payload.nonce))]
    pub async fn dispatch(&self, payload: JobPayload) -> Result<DispatchReceipt> {
        let estimate = self.estimator.estimate(payload).await?;
        let fee = self.fees.quote(self.destination, &estimate).await?;
        let outcome = self
            .submitter
            .submit(self.destination, &estimate.payload, fee.total)
            .await?;

        let job_id = estimate.payload.job_id();
        info!(
            job = %job_id,
            gas_limit = estimate.gas_limit,
            gas_price = %estimate.gas_price,
            fee = %fee.total,
            txid = ?outcome.txid,
            "Dispatched job"
        );
        Ok(DispatchReceipt {
            job_id,
            estimate,
            fee,
            outcome,
        })
    }
}
