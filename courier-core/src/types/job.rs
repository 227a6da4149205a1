use courier_types::JobId;
use ethers::core::types::{Address, U256};

use crate::SlashReceipt;

/// Lifecycle state of a job record
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    /// Assigned and waiting for an authorized executor
    Pending,
    /// Effect applied
    Completed,
    /// Effect reverted. The id is consumed all the same
    FailedTerminal {
        /// Revert reason reported by the effect
        reason: String,
    },
}

impl JobStatus {
    /// True once no operator action may touch this job again
    pub fn is_final(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Per-job state kept by the job store
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Payload hash
    pub id: JobId,
    /// Chain the payload was emitted on
    pub source_chain: u32,
    /// Pod the job was assigned to
    pub pod: u32,
    /// Primary operator. Zero means anyone may execute
    pub primary: Address,
    /// Destination block at assignment
    pub assigned_block: u64,
    /// Destination timestamp at assignment, start of the primary window
    pub assigned_at: u64,
    /// Positional offsets into the pod member list, one per fallback window
    pub fallbacks: Vec<u32>,
    /// Gas limit embedded in the payload
    pub gas_limit: u64,
    /// Gas price embedded in the payload
    pub gas_price: U256,
    /// Lifecycle state
    pub status: JobStatus,
}

impl JobRecord {
    /// Whether the job is open to any caller from the start
    pub fn is_open(&self) -> bool {
        self.primary.is_zero()
    }
}

/// Operator-facing view of a job
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    /// Payload hash
    pub id: JobId,
    /// Pod the job was assigned to
    pub pod: u32,
    /// Primary operator
    pub primary: Address,
    /// Start of the primary window
    pub start_time: u64,
    /// Length of each window
    pub window_duration: u64,
    /// Fallback offsets, in escalation order
    pub fallbacks: Vec<u32>,
    /// Gas limit the executor must supply
    pub gas_limit: u64,
    /// Highest gas price the executor may use, before tolerance
    pub gas_price: U256,
    /// Lifecycle state
    pub status: JobStatus,
}

impl JobDetails {
    /// Project a record with the window length in force
    pub fn from_record(record: &JobRecord, window_duration: u64) -> Self {
        Self {
            id: record.id,
            pod: record.pod,
            primary: record.primary,
            start_time: record.assigned_at,
            window_duration,
            fallbacks: record.fallbacks.clone(),
            gas_limit: record.gas_limit,
            gas_price: record.gas_price,
            status: record.status.clone(),
        }
    }

    /// Start of fallback window `k` (1-based)
    pub fn fallback_window_start(&self, k: usize) -> u64 {
        let offset = self.window_duration.saturating_mul(k as u64);
        self.start_time.saturating_add(offset)
    }

    /// Whether the primary window and every fallback window have lapsed at
    /// `now`. Open jobs never lapse
    pub fn windows_lapsed(&self, now: u64) -> bool {
        !self.primary.is_zero() && now >= self.fallback_window_start(self.fallbacks.len() + 1)
    }
}

/// Gas parameters of the executing transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionParams {
    /// Gas available to the execution
    pub gas_left: u64,
    /// Gas price the executor is paying
    pub gas_price: U256,
}

/// Result of running a job's effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Effect applied
    Completed,
    /// Effect reverted, job consumed
    Reverted(String),
}

/// What an execution did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReceipt {
    /// Executed job
    pub job_id: JobId,
    /// Caller that executed it
    pub executor: Address,
    /// Effect result
    pub outcome: ExecutionOutcome,
    /// Slash applied to the primary, for fallback executions
    pub slash: Option<SlashReceipt>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn details(primary: Address) -> JobDetails {
        JobDetails {
            id: JobId::default(),
            pod: 1,
            primary,
            start_time: 1_000,
            window_duration: 60,
            fallbacks: vec![0, 1],
            gas_limit: 100_000,
            gas_price: U256::one(),
            status: JobStatus::Pending,
        }
    }

    #[test]
    fn windows_lapse_after_the_last_fallback() {
        let job = details(Address::repeat_byte(0x01));
        assert_eq!(job.fallback_window_start(1), 1_060);
        // primary plus two fallback windows
        assert!(!job.windows_lapsed(1_179));
        assert!(job.windows_lapsed(1_180));
    }

    #[test]
    fn open_jobs_never_lapse() {
        assert!(!details(Address::zero()).windows_lapsed(u64::MAX));
    }
}
