//! Off-chain job discovery and execution for a single bonded operator

use color_eyre::{eyre::bail, Result};
use courier_configuration::agent::OperatorConfig;
use courier_core::{
    CoordinatorError, CoordinatorEvent, ExecutionOutcome, ExecutionParams, JobCoordinator,
    JobDetails, JobId, RetryHint, WindowPhase,
};
use ethers::core::types::Bytes;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::broadcast::{error::TryRecvError, Receiver},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::{CoreMetrics, OperatorError};

/// Result of one attempt at a job, or of one pass over all jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Progress was made, go again immediately
    Advance,
    /// Nothing to do right now, wait for state to move
    Repeat,
}

#[derive(Debug, Clone)]
struct KnownJob {
    details: JobDetails,
    payload: Bytes,
}

/// Watches a coordinator for jobs and executes those this operator may run
#[derive(Debug)]
pub struct Operator<J> {
    coordinator: Arc<J>,
    config: OperatorConfig,
    events: Receiver<CoordinatorEvent>,
    known: HashMap<JobId, KnownJob>,
    chain: String,
    metrics: Arc<CoreMetrics>,
}

impl<J> std::fmt::Display for Operator<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Operator: {{ operator: {:?}, chain: {}, pods: {:?} }}",
            self.config.operator, self.chain, self.config.pods
        )
    }
}

impl<J> Operator<J>
where
    J: JobCoordinator + 'static,
{
    /// Subscribe to `coordinator`. Jobs announced before this call are not
    /// seen
    pub fn new(coordinator: Arc<J>, config: OperatorConfig, metrics: Arc<CoreMetrics>) -> Self {
        let events = coordinator.subscribe();
        let chain = coordinator.chain_id().to_string();
        Self {
            coordinator,
            config,
            events,
            known: Default::default(),
            chain,
            metrics,
        }
    }

    /// Number of jobs this operator is still tracking
    pub fn tracked(&self) -> usize {
        self.known.len()
    }

    fn wants_pod(&self, pod: u32) -> bool {
        self.config
            .pods
            .as_ref()
            .map(|pods| pods.contains(&pod))
            .unwrap_or(true)
    }

    fn drain_events(&mut self) -> Result<(), OperatorError> {
        loop {
            match self.events.try_recv() {
                Ok(CoordinatorEvent::JobAvailable { details, payload }) => {
                    self.metrics.jobs_seen(&self.chain).inc();
                    if !self.wants_pod(details.pod) {
                        debug!(job = %details.id, pod = details.pod, "Ignoring job outside configured pods");
                        continue;
                    }
                    self.known.insert(details.id, KnownJob { details, payload });
                }
                Ok(CoordinatorEvent::JobCompleted { job, .. })
                | Ok(CoordinatorEvent::JobFailed { job, .. }) => {
                    self.known.remove(&job);
                }
                Ok(_) => {}
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Operator fell behind the coordinator's events");
                }
                Err(TryRecvError::Closed) => return Err(OperatorError::EventsClosed),
            }
        }
    }

    fn should_execute(&self, phase: WindowPhase) -> bool {
        !phase.is_escalated() || self.config.execute_as_fallback
    }

    async fn rejected(&self, id: &JobId, job: &KnownJob, err: &CoordinatorError) -> Flow {
        self.metrics.rejections(&self.chain, err.code()).inc();
        let settled = match err.retry_hint() {
            RetryHint::Never => true,
            RetryHint::Later => false,
            // no later window can open for this operator
            RetryHint::DifferentCaller => job
                .details
                .windows_lapsed(self.coordinator.timestamp().await),
        };
        if settled {
            info!(job = %id, code = err.code(), "Dropping job");
            Flow::Advance
        } else {
            debug!(job = %id, code = err.code(), "Job not executable yet");
            Flow::Repeat
        }
    }

    /// Attempt a single job.
    ///
    /// `Advance` means the job is settled for this operator: executed, or
    /// rejected in a way that will never change. `Repeat` means try later.
    #[instrument(skip(self, id, job), fields(job = %id))]
    async fn try_job(&self, id: JobId, job: &KnownJob) -> Flow {
        let operator = self.config.operator;
        // execute with exactly what the payload budgets for
        let params = ExecutionParams {
            gas_left: job.details.gas_limit,
            gas_price: job.details.gas_price,
        };

        let phase = match self
            .coordinator
            .check_execution(operator, id, params)
            .await
        {
            Ok(phase) => phase,
            Err(e) => return self.rejected(&id, job, &e).await,
        };
        if !self.should_execute(phase) {
            debug!(?phase, "Not executing as fallback");
            return Flow::Repeat;
        }

        match self
            .coordinator
            .execute_job(operator, &job.payload, params)
            .await
        {
            Ok(receipt) => {
                let outcome = match &receipt.outcome {
                    ExecutionOutcome::Completed => "completed",
                    ExecutionOutcome::Reverted(_) => "failed",
                };
                self.metrics.executions(&self.chain, outcome).inc();
                if let Some(slash) = &receipt.slash {
                    self.metrics.slashes(&self.chain).inc();
                    info!(primary = ?slash.operator, slashed = %slash.slashed, "Slashed primary");
                }
                info!(?phase, outcome, "Executed job");
                Flow::Advance
            }
            Err(e) => self.rejected(&id, job, &e).await,
        }
    }

    /// Pull new events and attempt every tracked job once
    pub async fn tick(&mut self) -> Result<Flow, OperatorError> {
        self.drain_events()?;

        let jobs: Vec<_> = self
            .known
            .iter()
            .map(|(id, job)| (*id, job.clone()))
            .collect();

        let mut flow = Flow::Repeat;
        for (id, job) in jobs {
            if let Flow::Advance = self.try_job(id, &job).await {
                self.known.remove(&id);
                flow = Flow::Advance;
            }
        }
        Ok(flow)
    }

    /// Poll forever, sleeping `interval` seconds whenever a pass made no
    /// progress
    pub fn run(mut self) -> JoinHandle<Result<()>> {
        let span = tracing::info_span!("Operator", operator = ?self.config.operator, chain = %self.chain);
        tokio::spawn(
            async move {
                info!(operator = %self, "Starting operator");
                loop {
                    match self.tick().await {
                        Ok(Flow::Advance) => {}
                        Ok(Flow::Repeat) => sleep(Duration::from_secs(self.config.interval)).await,
                        Err(e) => {
                            error!("fatal error in operator: {}", e);
                            bail!(e)
                        }
                    }
                }
            }
            .instrument(span),
        )
    }
}
