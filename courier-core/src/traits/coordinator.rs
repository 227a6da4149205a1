use async_trait::async_trait;
use courier_types::JobId;
use ethers::core::types::{Address, U256};
use tokio::sync::broadcast;

use crate::{
    BondRequirement, CoordinatorError, CoordinatorEvent, ExecutionParams, ExecutionReceipt,
    JobDetails, WindowPhase,
};

/// Operator-facing view of a running coordinator
#[async_trait]
pub trait JobCoordinator: Send + Sync + std::fmt::Debug {
    /// Chain id of the destination this coordinator runs on
    fn chain_id(&self) -> u32;

    /// Subscribe to coordinator events
    fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent>;

    /// Current timestamp of the destination chain, in seconds
    async fn timestamp(&self) -> u64;

    /// Current details of a job, if it was ever delivered
    async fn job_details(&self, id: JobId) -> Option<JobDetails>;

    /// Ids of jobs still waiting for execution
    async fn pending_jobs(&self) -> Vec<JobId>;

    /// All members of a pod, in selection order
    async fn pod_operators(&self, pod: u32) -> Result<Vec<Address>, CoordinatorError>;

    /// A slice of a pod's members
    async fn pod_operator_slice(
        &self,
        pod: u32,
        offset: usize,
        count: usize,
    ) -> Result<Vec<Address>, CoordinatorError>;

    /// Bond required to join a pod
    async fn bond_requirement(&self, pod: u32) -> Result<BondRequirement, CoordinatorError>;

    /// Bonded amount of an operator, zero if unbonded
    async fn bonded_amount(&self, operator: Address) -> U256;

    /// Pod of an operator, zero if unbonded
    async fn bonded_pod(&self, operator: Address) -> u32;

    /// Check whether `caller` could execute a job right now, without
    /// executing it
    async fn check_execution(
        &self,
        caller: Address,
        id: JobId,
        params: ExecutionParams,
    ) -> Result<WindowPhase, CoordinatorError>;

    /// Execute a job from its canonical payload bytes
    async fn execute_job(
        &self,
        caller: Address,
        payload: &[u8],
        params: ExecutionParams,
    ) -> Result<ExecutionReceipt, CoordinatorError>;

    /// Bond `amount` for `operator` into `pod`, paid by `caller`
    async fn bond(
        &self,
        caller: Address,
        operator: Address,
        amount: U256,
        pod: u32,
    ) -> Result<(), CoordinatorError>;

    /// Add `amount` to an existing bond, paid by `caller`
    async fn top_up(
        &self,
        caller: Address,
        operator: Address,
        amount: U256,
    ) -> Result<(), CoordinatorError>;

    /// Unbond `operator` and pay its bond to `recipient`
    async fn unbond(
        &self,
        caller: Address,
        operator: Address,
        recipient: Address,
    ) -> Result<U256, CoordinatorError>;
}
