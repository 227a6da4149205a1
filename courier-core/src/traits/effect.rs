use ethers::core::types::Address;

use crate::JobPayload;

/// A reverted effect
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("effect reverted: {reason}")]
pub struct EffectRevert {
    /// Revert reason
    pub reason: String,
}

impl EffectRevert {
    /// Revert with a reason
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The state change a job performs on its target
pub trait JobEffect: std::fmt::Debug {
    /// Apply the payload's call data to its target with `gas_limit` gas
    fn apply(
        &mut self,
        payload: &JobPayload,
        executor: Address,
        gas_limit: u64,
    ) -> Result<(), EffectRevert>;
}
