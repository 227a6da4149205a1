//! The destination-side protocol surface: delivery, execution and bonding

use async_trait::async_trait;
use courier_configuration::ProtocolConfig;
use courier_types::JobId;
use ethers::core::types::{Address, Bytes, U256};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::{broadcast, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

use crate::{
    BondRequirement, BondSchedule, BondingLedger, ChainContext, CoordinatorError,
    ExecutionOutcome, ExecutionParams, ExecutionReceipt, Executor, JobCoordinator, JobDetails,
    JobEffect, JobPayload, JobStore, OperatorKind, OwnerLookup, Scheduler, SlashReceipt,
    UtilityToken, WindowPhase,
};

const EVENT_CAPACITY: usize = 1024;

/// Notifications emitted on every state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// A job was assigned and awaits execution
    JobAvailable {
        /// Assignment
        details: JobDetails,
        /// Canonical payload bytes, needed to execute
        payload: Bytes,
    },
    /// A job's effect was applied
    JobCompleted {
        /// Job
        job: JobId,
        /// Executing operator
        executor: Address,
    },
    /// A job's effect reverted
    JobFailed {
        /// Job
        job: JobId,
        /// Executing operator
        executor: Address,
        /// Revert reason
        reason: String,
    },
    /// A primary was slashed by a fallback execution
    OperatorSlashed(SlashReceipt),
    /// An operator joined a pod
    OperatorBonded {
        /// Operator
        operator: Address,
        /// Pod joined
        pod: u32,
        /// Bonded amount
        amount: U256,
    },
    /// An operator left its pod
    OperatorUnbonded {
        /// Operator
        operator: Address,
        /// Amount paid out
        amount: U256,
    },
}

/// Destination-side protocol state and its collaborators
#[derive(Debug)]
pub struct Coordinator<T, C, E> {
    chain_id: u32,
    config: ProtocolConfig,
    ledger: BondingLedger<T>,
    jobs: JobStore,
    chain: C,
    effect: E,
    owners: Arc<dyn OwnerLookup>,
    trusted: HashMap<u32, HashSet<Address>>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl<T, C, E> Coordinator<T, C, E>
where
    T: UtilityToken,
    C: ChainContext,
    E: JobEffect,
{
    /// Coordinator for chain `chain_id`, holding bonds at `ledger_address`
    pub fn new(
        chain_id: u32,
        config: ProtocolConfig,
        ledger_address: Address,
        token: T,
        chain: C,
        effect: E,
        owners: Arc<dyn OwnerLookup>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            chain_id,
            ledger: BondingLedger::new(ledger_address, token, BondSchedule::new(&config)),
            config,
            jobs: JobStore::default(),
            chain,
            effect,
            owners,
            trusted: HashMap::new(),
            events,
        }
    }

    /// Chain this coordinator runs on
    pub fn chain_id(&self) -> u32 {
        self.chain_id
    }

    /// Protocol parameters in force
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Bonding ledger
    pub fn ledger(&self) -> &BondingLedger<T> {
        &self.ledger
    }

    /// Job records
    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Bonding token
    pub fn token(&self) -> &T {
        self.ledger.token()
    }

    /// Mutable bonding token, for funding accounts
    pub fn token_mut(&mut self) -> &mut T {
        self.ledger.token_mut()
    }

    /// Destination chain state
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Mutable chain state, for moving time
    pub fn chain_mut(&mut self) -> &mut C {
        &mut self.chain
    }

    /// Job effect
    pub fn effect(&self) -> &E {
        &self.effect
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: CoordinatorEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    /// Accept payloads from `sender` on `chain`
    pub fn register_source(&mut self, chain: u32, sender: Address) {
        info!(chain, sender = ?sender, "Registered trusted source");
        self.trusted.entry(chain).or_default().insert(sender);
    }

    /// Whether `sender` is trusted on `chain`
    pub fn is_trusted(&self, chain: u32, sender: Address) -> bool {
        self.trusted
            .get(&chain)
            .map(|senders| senders.contains(&sender))
            .unwrap_or(false)
    }

    /// Receive a payload from the transport and assign it
    pub fn deliver(
        &mut self,
        payload: &[u8],
        source_chain: u32,
        sender: Address,
    ) -> Result<JobDetails, CoordinatorError> {
        let payload = JobPayload::from_bytes(payload)?;
        self.deliver_payload(&payload, source_chain, sender)
    }

    /// Assign an already decoded payload
    pub fn deliver_payload(
        &mut self,
        payload: &JobPayload,
        source_chain: u32,
        sender: Address,
    ) -> Result<JobDetails, CoordinatorError> {
        if !self.is_trusted(source_chain, sender) {
            return Err(CoordinatorError::UntrustedSource {
                chain: source_chain,
                sender,
            });
        }
        if payload.source_chain != source_chain {
            return Err(CoordinatorError::SourceChainMismatch {
                payload: payload.source_chain,
                delivered: source_chain,
            });
        }
        let id = payload.job_id();
        if self.jobs.contains(&id) {
            warn!(job = %id, "Rejected duplicate delivery");
            return Err(CoordinatorError::DuplicateJob(id));
        }

        let record = Scheduler::new(&self.config).assign(payload, self.ledger.pods(), &self.chain);
        let details = JobDetails::from_record(&record, self.config.window_duration);
        self.jobs.insert(record)?;

        info!(
            job = %id,
            pod = details.pod,
            primary = ?details.primary,
            start = details.start_time,
            "Job available"
        );
        self.emit(CoordinatorEvent::JobAvailable {
            details: details.clone(),
            payload: payload.to_bytes(),
        });
        Ok(details)
    }

    /// Current details of a job
    pub fn job_details(&self, id: &JobId) -> Option<JobDetails> {
        self.jobs
            .get(id)
            .map(|r| JobDetails::from_record(r, self.config.window_duration))
    }

    /// Members of a pod
    pub fn pod_operators(&self, pod: u32) -> Result<Vec<Address>, CoordinatorError> {
        Ok(self.ledger.pods().members(pod)?.to_vec())
    }

    /// Up to `count` members of a pod from `offset`
    pub fn pod_operator_slice(
        &self,
        pod: u32,
        offset: usize,
        count: usize,
    ) -> Result<Vec<Address>, CoordinatorError> {
        self.ledger.pods().slice(pod, offset, count)
    }

    /// Member count of a pod
    pub fn pod_operator_count(&self, pod: u32) -> Result<usize, CoordinatorError> {
        self.ledger.pods().member_count(pod)
    }

    /// Number of created pods
    pub fn pod_count(&self) -> u32 {
        self.ledger.pods().count()
    }

    /// Bond required to join a pod
    pub fn bond_requirement(&self, pod: u32) -> Result<BondRequirement, CoordinatorError> {
        self.ledger.requirement(pod)
    }

    /// Bonded amount of an operator
    pub fn bonded_amount(&self, operator: Address) -> U256 {
        self.ledger.bonded_amount(operator)
    }

    /// Pod of an operator, zero if unbonded
    pub fn bonded_pod(&self, operator: Address) -> u32 {
        self.ledger.bonded_pod(operator)
    }

    /// Dry run of the execution checks for `caller`
    pub fn check_execution(
        &self,
        caller: Address,
        id: &JobId,
        params: ExecutionParams,
    ) -> Result<WindowPhase, CoordinatorError> {
        let record = self.jobs.pending(id)?;
        Executor::<T, E>::check(
            &self.config,
            record,
            &self.ledger,
            caller,
            self.chain.timestamp(),
            params,
        )
    }

    /// Execute a job from its canonical bytes
    pub fn execute_job(
        &mut self,
        caller: Address,
        payload: &[u8],
        params: ExecutionParams,
    ) -> Result<ExecutionReceipt, CoordinatorError> {
        let payload = JobPayload::from_bytes(payload)?;
        self.execute_payload(caller, &payload, params)
    }

    /// Execute an already decoded payload
    pub fn execute_payload(
        &mut self,
        caller: Address,
        payload: &JobPayload,
        params: ExecutionParams,
    ) -> Result<ExecutionReceipt, CoordinatorError> {
        let now = self.chain.timestamp();
        let receipt = Executor::new(&self.config, &mut self.jobs, &mut self.ledger, &mut self.effect)
            .execute(caller, payload, now, params)?;

        if let Some(slash) = receipt.slash {
            self.emit(CoordinatorEvent::OperatorSlashed(slash));
        }
        match &receipt.outcome {
            ExecutionOutcome::Completed => self.emit(CoordinatorEvent::JobCompleted {
                job: receipt.job_id,
                executor: caller,
            }),
            ExecutionOutcome::Reverted(reason) => self.emit(CoordinatorEvent::JobFailed {
                job: receipt.job_id,
                executor: caller,
                reason: reason.clone(),
            }),
        }
        Ok(receipt)
    }

    /// Bond `amount` for `operator` into `pod`, paid by `caller`
    pub fn bond(
        &mut self,
        caller: Address,
        operator: Address,
        amount: U256,
        pod: u32,
    ) -> Result<(), CoordinatorError> {
        let kind = match self.owners.owner_of(operator) {
            Some(owner) => OperatorKind::Delegated { owner },
            None => OperatorKind::Account,
        };
        let record = self.ledger.bond(caller, operator, amount, pod, kind)?;
        self.emit(CoordinatorEvent::OperatorBonded {
            operator,
            pod: record.pod,
            amount: record.amount,
        });
        Ok(())
    }

    /// Add to an existing bond
    pub fn top_up(
        &mut self,
        caller: Address,
        operator: Address,
        amount: U256,
    ) -> Result<(), CoordinatorError> {
        self.ledger.top_up(caller, operator, amount)?;
        Ok(())
    }

    /// Leave the pod and withdraw the bond to `recipient`
    pub fn unbond(
        &mut self,
        caller: Address,
        operator: Address,
        recipient: Address,
    ) -> Result<U256, CoordinatorError> {
        let amount = self.ledger.unbond(caller, operator, recipient)?;
        self.emit(CoordinatorEvent::OperatorUnbonded { operator, amount });
        Ok(amount)
    }
}

/// A coordinator shared between tasks. The lock serializes operations the
/// way the destination chain serializes transactions
#[derive(Debug)]
pub struct SharedCoordinator<T, C, E> {
    chain_id: u32,
    inner: Arc<RwLock<Coordinator<T, C, E>>>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl<T, C, E> Clone for SharedCoordinator<T, C, E> {
    fn clone(&self) -> Self {
        Self {
            chain_id: self.chain_id,
            inner: self.inner.clone(),
            events: self.events.clone(),
        }
    }
}

impl<T, C, E> SharedCoordinator<T, C, E>
where
    T: UtilityToken,
    C: ChainContext,
    E: JobEffect,
{
    /// Share `coordinator`
    pub fn new(coordinator: Coordinator<T, C, E>) -> Self {
        Self {
            chain_id: coordinator.chain_id,
            events: coordinator.events.clone(),
            inner: Arc::new(RwLock::new(coordinator)),
        }
    }

    /// Read access to the coordinator
    pub async fn read(&self) -> RwLockReadGuard<'_, Coordinator<T, C, E>> {
        self.inner.read().await
    }

    /// Exclusive access to the coordinator
    pub async fn write(&self) -> RwLockWriteGuard<'_, Coordinator<T, C, E>> {
        self.inner.write().await
    }
}

#[async_trait]
impl<T, C, E> JobCoordinator for SharedCoordinator<T, C, E>
where
    T: UtilityToken + Send + Sync,
    C: ChainContext + Send + Sync,
    E: JobEffect + Send + Sync,
{
    fn chain_id(&self) -> u32 {
        self.chain_id
    }

    fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    async fn timestamp(&self) -> u64 {
        self.read().await.chain().timestamp()
    }

    async fn job_details(&self, id: JobId) -> Option<JobDetails> {
        self.read().await.job_details(&id)
    }

    async fn pending_jobs(&self) -> Vec<JobId> {
        self.read().await.jobs().pending_ids()
    }

    async fn pod_operators(&self, pod: u32) -> Result<Vec<Address>, CoordinatorError> {
        self.read().await.pod_operators(pod)
    }

    async fn pod_operator_slice(
        &self,
        pod: u32,
        offset: usize,
        count: usize,
    ) -> Result<Vec<Address>, CoordinatorError> {
        self.read().await.pod_operator_slice(pod, offset, count)
    }

    async fn bond_requirement(&self, pod: u32) -> Result<BondRequirement, CoordinatorError> {
        self.read().await.bond_requirement(pod)
    }

    async fn bonded_amount(&self, operator: Address) -> U256 {
        self.read().await.bonded_amount(operator)
    }

    async fn bonded_pod(&self, operator: Address) -> u32 {
        self.read().await.bonded_pod(operator)
    }

    async fn check_execution(
        &self,
        caller: Address,
        id: JobId,
        params: ExecutionParams,
    ) -> Result<WindowPhase, CoordinatorError> {
        self.read().await.check_execution(caller, &id, params)
    }

    #[instrument(skip(self, payload), fields(chain = self.chain_id))]
    async fn execute_job(
        &self,
        caller: Address,
        payload: &[u8],
        params: ExecutionParams,
    ) -> Result<ExecutionReceipt, CoordinatorError> {
        let result = self.write().await.execute_job(caller, payload, params);
        if let Err(e) = &result {
            debug!(caller = ?caller, code = e.code(), "Execution rejected");
        }
        result
    }

    #[instrument(skip(self), fields(chain = self.chain_id))]
    async fn bond(
        &self,
        caller: Address,
        operator: Address,
        amount: U256,
        pod: u32,
    ) -> Result<(), CoordinatorError> {
        self.write().await.bond(caller, operator, amount, pod)
    }

    #[instrument(skip(self), fields(chain = self.chain_id))]
    async fn top_up(
        &self,
        caller: Address,
        operator: Address,
        amount: U256,
    ) -> Result<(), CoordinatorError> {
        self.write().await.top_up(caller, operator, amount)
    }

    #[instrument(skip(self), fields(chain = self.chain_id))]
    async fn unbond(
        &self,
        caller: Address,
        operator: Address,
        recipient: Address,
    ) -> Result<U256, CoordinatorError> {
        self.write().await.unbond(caller, operator, recipient)
    }
}
