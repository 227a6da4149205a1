use courier_types::JobId;
use ethers::core::types::{Address, U256};

use crate::{PayloadError, TokenError};

/// How a rejected caller should react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
    /// The same call may succeed later
    Later,
    /// The call will never succeed as sent
    Never,
    /// The call may succeed from a different caller
    DifferentCaller,
}

/// Rejections of coordinator operations. None of them change state
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Unknown job, or job already completed or failed
    #[error("Invalid job {0}")]
    InvalidJob(JobId),
    /// A delivered payload already has a record
    #[error("Duplicate job {0}")]
    DuplicateJob(JobId),
    /// Caller is not the primary during the primary window
    #[error("Job {job} is still in the window of its primary {primary:?}")]
    OperatorHasTime {
        /// Job
        job: JobId,
        /// Primary operator
        primary: Address,
    },
    /// Caller is not the fallback of the current window
    #[error("Job {job} is in fallback window {window} of {expected:?}")]
    InvalidFallback {
        /// Job
        job: JobId,
        /// 1-based fallback window
        window: usize,
        /// Operator the window belongs to
        expected: Address,
    },
    /// Every fallback window lapsed and the job is stalled
    #[error("Fallbacks exhausted for job {0}")]
    FallbacksExhausted(JobId),
    /// Caller gas price exceeds the embedded price plus tolerance
    #[error("Gas spike detected: offered {offered}, allowed {allowed}")]
    GasSpike {
        /// Highest accepted price
        allowed: U256,
        /// Caller's price
        offered: U256,
    },
    /// Caller did not supply the embedded gas limit
    #[error("Not enough gas left: {provided} of {required}")]
    NotEnoughGas {
        /// Embedded gas limit
        required: u64,
        /// Gas supplied
        provided: u64,
    },
    /// Bond below the pod's current requirement
    #[error("Bond of {offered} is below the pod minimum of {required}")]
    BondBelowMinimum {
        /// Current requirement
        required: U256,
        /// Offered bond
        offered: U256,
    },
    /// Operator already bonded
    #[error("Operator {0:?} is bonded")]
    OperatorIsBonded(Address),
    /// Operator not bonded
    #[error("Operator {0:?} is not bonded")]
    NotBonded(Address),
    /// Caller lacks unbond authority
    #[error("{caller:?} may not unbond {operator:?}")]
    NotOwner {
        /// Bonded operator
        operator: Address,
        /// Rejected caller
        caller: Address,
    },
    /// Pod was never created
    #[error("Pod {0} does not exist")]
    PodDoesNotExist(u32),
    /// Slash beneficiary cannot receive the slash
    #[error("Invalid slash beneficiary {0:?}")]
    InvalidBeneficiary(Address),
    /// Sender is not trusted for the delivering chain
    #[error("Untrusted source {sender:?} on chain {chain}")]
    UntrustedSource {
        /// Delivering chain
        chain: u32,
        /// Transport sender
        sender: Address,
    },
    /// Payload claims a different source chain than the delivery
    #[error("Payload from chain {payload} delivered as chain {delivered}")]
    SourceChainMismatch {
        /// Source chain in the payload
        payload: u32,
        /// Chain the transport delivered from
        delivered: u32,
    },
    /// Payload could not be decoded
    #[error(transparent)]
    Payload(#[from] PayloadError),
    /// Token collaborator failure
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl CoordinatorError {
    /// Stable reason code
    pub fn code(&self) -> &'static str {
        match self {
            CoordinatorError::InvalidJob(_) => "invalid job",
            CoordinatorError::DuplicateJob(_) => "duplicate job",
            CoordinatorError::OperatorHasTime { .. } => "operator has time",
            CoordinatorError::InvalidFallback { .. } => "invalid fallback",
            CoordinatorError::FallbacksExhausted(_) => "fallbacks exhausted",
            CoordinatorError::GasSpike { .. } => "gas spike detected",
            CoordinatorError::NotEnoughGas { .. } => "not enough gas left",
            CoordinatorError::BondBelowMinimum { .. } => "bond below pod minimum",
            CoordinatorError::OperatorIsBonded(_) => "operator is bonded",
            CoordinatorError::NotBonded(_) => "not bonded",
            CoordinatorError::NotOwner { .. } => "unbonding by non-owner",
            CoordinatorError::PodDoesNotExist(_) => "pod does not exist",
            CoordinatorError::InvalidBeneficiary(_) => "invalid beneficiary",
            CoordinatorError::UntrustedSource { .. } => "untrusted source",
            CoordinatorError::SourceChainMismatch { .. } => "source chain mismatch",
            CoordinatorError::Payload(_) => "invalid payload",
            CoordinatorError::Token(_) => "token transfer failed",
        }
    }

    /// Whether and how the rejected call may be retried
    pub fn retry_hint(&self) -> RetryHint {
        match self {
            CoordinatorError::OperatorHasTime { .. }
            | CoordinatorError::GasSpike { .. }
            | CoordinatorError::NotEnoughGas { .. }
            | CoordinatorError::Token(_) => RetryHint::Later,
            CoordinatorError::InvalidFallback { .. }
            | CoordinatorError::NotOwner { .. }
            | CoordinatorError::NotBonded(_) => RetryHint::DifferentCaller,
            _ => RetryHint::Never,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn window_rejections_carry_distinct_hints() {
        let job = JobId::default();
        let has_time = CoordinatorError::OperatorHasTime {
            job,
            primary: Address::zero(),
        };
        let fallback = CoordinatorError::InvalidFallback {
            job,
            window: 1,
            expected: Address::zero(),
        };
        assert_eq!(has_time.code(), "operator has time");
        assert_eq!(has_time.retry_hint(), RetryHint::Later);
        assert_eq!(fallback.code(), "invalid fallback");
        assert_eq!(fallback.retry_hint(), RetryHint::DifferentCaller);
        assert_eq!(CoordinatorError::InvalidJob(job).retry_hint(), RetryHint::Never);
    }
}
