use courier_types::JobId;
use ethers::core::types::Address;
use std::collections::HashSet;

use crate::{EffectRevert, JobEffect, JobPayload};

/// Records applied jobs and reverts for configured targets
#[derive(Debug, Default, Clone)]
pub struct RecordingEffect {
    reverting: HashSet<Address>,
    applied: Vec<(JobId, Address)>,
}

impl RecordingEffect {
    /// Make every job aimed at `target` revert
    pub fn revert_on(mut self, target: Address) -> Self {
        self.reverting.insert(target);
        self
    }

    /// Applied jobs with their executors, in order
    pub fn applied(&self) -> &[(JobId, Address)] {
        &self.applied
    }
}

impl JobEffect for RecordingEffect {
    fn apply(
        &mut self,
        payload: &JobPayload,
        executor: Address,
        _gas_limit: u64,
    ) -> Result<(), EffectRevert> {
        if self.reverting.contains(&payload.target) {
            return Err(EffectRevert::new(format!(
                "target {:?} reverted",
                payload.target
            )));
        }
        self.applied.push((payload.job_id(), executor));
        Ok(())
    }
}
