use courier_configuration::{PodPolicy, ProtocolConfig};
use courier_types::JobId;
use ethers::core::types::{Address, H256};

use crate::{
    jobs::entropy::{fallback_tweak, pick, seed, POD_TWEAK, PRIMARY_TWEAK},
    ChainContext, JobPayload, JobRecord, JobStatus, PodRegistry,
};

/// Chooses a pod, a primary and fallback positions for new jobs. Holds no
/// state of its own
#[derive(Debug, Clone, Copy)]
pub struct Scheduler<'a> {
    config: &'a ProtocolConfig,
}

impl<'a> Scheduler<'a> {
    /// Scheduler applying `config`
    pub fn new(config: &'a ProtocolConfig) -> Self {
        Self { config }
    }

    /// Pod a job lands in
    pub fn choose_pod(&self, id: &JobId, block_hash: &H256, pods: &PodRegistry) -> u32 {
        match self.config.pod_policy {
            PodPolicy::Fixed(pod) => pod,
            PodPolicy::Random => {
                let populated = pods.populated();
                if populated.is_empty() {
                    return 1;
                }
                populated[pick(seed(id, block_hash, POD_TWEAK), populated.len())]
            }
        }
    }

    /// Build the record of a freshly delivered job
    pub fn assign<C>(&self, payload: &JobPayload, pods: &PodRegistry, chain: &C) -> JobRecord
    where
        C: ChainContext,
    {
        let id = payload.job_id();
        let block_hash = chain.recent_block_hash();
        let pod = self.choose_pod(&id, &block_hash, pods);
        let members = pods.members(pod).unwrap_or_default();

        let (primary, fallbacks) = if members.is_empty() {
            (Address::zero(), vec![])
        } else {
            let primary = members[pick(seed(&id, &block_hash, PRIMARY_TWEAK), members.len())];
            let fallbacks = (0..self.config.fallback_count as usize)
                .map(|k| pick(seed(&id, &block_hash, fallback_tweak(k)), members.len()) as u32)
                .collect();
            (primary, fallbacks)
        };

        JobRecord {
            id,
            source_chain: payload.source_chain,
            pod,
            primary,
            assigned_block: chain.block_number(),
            assigned_at: chain.timestamp(),
            fallbacks,
            gas_limit: payload.gas_limit,
            gas_price: payload.gas_price,
            status: JobStatus::Pending,
        }
    }
}
