use courier_configuration::{apply_bps, ProtocolConfig, BPS_DENOMINATOR};
use ethers::core::types::{Address, U256};
use tracing::{info, warn};

use crate::{
    BondingLedger, CoordinatorError, ExecutionOutcome, ExecutionParams, ExecutionReceipt,
    ExecutionWindow, JobEffect, JobPayload, JobRecord, JobStatus, JobStore, SlashBeneficiary,
    UtilityToken, WindowPhase,
};

/// Highest gas price an executor may use for a job embedding `embedded`
pub fn price_ceiling(embedded: U256, tolerance_bps: u32) -> U256 {
    apply_bps(embedded, BPS_DENOMINATOR.saturating_add(tolerance_bps))
}

/// Validates and settles job executions over the stores it borrows
#[derive(Debug)]
pub struct Executor<'a, T, E> {
    config: &'a ProtocolConfig,
    jobs: &'a mut JobStore,
    ledger: &'a mut BondingLedger<T>,
    effect: &'a mut E,
}

impl<'a, T, E> Executor<'a, T, E>
where
    T: UtilityToken,
    E: JobEffect,
{
    /// Executor over the coordinator's stores
    pub fn new(
        config: &'a ProtocolConfig,
        jobs: &'a mut JobStore,
        ledger: &'a mut BondingLedger<T>,
        effect: &'a mut E,
    ) -> Self {
        Self {
            config,
            jobs,
            ledger,
            effect,
        }
    }

    /// Every check an execution runs before touching state
    pub fn check(
        config: &ProtocolConfig,
        record: &JobRecord,
        ledger: &BondingLedger<T>,
        caller: Address,
        now: u64,
        params: ExecutionParams,
    ) -> Result<WindowPhase, CoordinatorError> {
        let window = ExecutionWindow::new(config, ledger.pods());
        let phase = window.authorize(record, caller, now, |a| ledger.is_bonded(a))?;

        let allowed = price_ceiling(record.gas_price, config.spike_tolerance_bps);
        if params.gas_price > allowed {
            return Err(CoordinatorError::GasSpike {
                allowed,
                offered: params.gas_price,
            });
        }
        if params.gas_left < record.gas_limit {
            return Err(CoordinatorError::NotEnoughGas {
                required: record.gas_limit,
                provided: params.gas_left,
            });
        }
        Ok(phase)
    }

    /// Execute `payload` as `caller` at `now`
    pub fn execute(
        self,
        caller: Address,
        payload: &JobPayload,
        now: u64,
        params: ExecutionParams,
    ) -> Result<ExecutionReceipt, CoordinatorError> {
        let id = payload.job_id();
        let record = self.jobs.pending(&id)?.clone();
        let phase = Self::check(self.config, &record, self.ledger, caller, now, params)?;

        let slash = if phase.is_escalated() && caller != record.primary {
            if self.ledger.is_bonded(record.primary) {
                let amount = self.ledger.requirement(record.pod)?.base;
                let beneficiary = if self.ledger.is_bonded(caller) {
                    SlashBeneficiary::Bond(caller)
                } else {
                    SlashBeneficiary::Account(caller)
                };
                Some(self.ledger.slash(record.primary, amount, beneficiary)?)
            } else {
                warn!(job = %id, primary = ?record.primary, "Primary unbonded before escalation, nothing to slash");
                None
            }
        } else {
            None
        };

        let (outcome, status) = match self.effect.apply(payload, caller, record.gas_limit) {
            Ok(()) => (ExecutionOutcome::Completed, JobStatus::Completed),
            Err(revert) => {
                warn!(job = %id, reason = %revert.reason, "Job effect reverted");
                (
                    ExecutionOutcome::Reverted(revert.reason.clone()),
                    JobStatus::FailedTerminal {
                        reason: revert.reason,
                    },
                )
            }
        };
        self.jobs.finish(&id, status)?;

        info!(job = %id, executor = ?caller, phase = ?phase, outcome = ?outcome, "Executed job");
        Ok(ExecutionReceipt {
            job_id: id,
            executor: caller,
            outcome,
            slash,
        })
    }
}
