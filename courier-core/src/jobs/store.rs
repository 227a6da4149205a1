use courier_types::JobId;
use std::collections::HashMap;

use crate::{CoordinatorError, JobRecord, JobStatus};

/// Per-job lifecycle records. A record is never removed, so a finished id
/// stays consumed
#[derive(Debug, Default, Clone)]
pub struct JobStore {
    jobs: HashMap<JobId, JobRecord>,
}

impl JobStore {
    /// Number of records, finished ones included
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Whether `id` has a record
    pub fn contains(&self, id: &JobId) -> bool {
        self.jobs.contains_key(id)
    }

    /// Record of `id`
    pub fn get(&self, id: &JobId) -> Option<&JobRecord> {
        self.jobs.get(id)
    }

    /// Record of `id` if it is still pending
    pub fn pending(&self, id: &JobId) -> Result<&JobRecord, CoordinatorError> {
        self.jobs
            .get(id)
            .filter(|r| r.status == JobStatus::Pending)
            .ok_or(CoordinatorError::InvalidJob(*id))
    }

    /// Ids of every pending job
    pub fn pending_ids(&self) -> Vec<JobId> {
        let mut ids: Vec<_> = self
            .jobs
            .values()
            .filter(|r| r.status == JobStatus::Pending)
            .map(|r| r.id)
            .collect();
        ids.sort();
        ids
    }

    /// Insert a fresh record
    pub fn insert(&mut self, record: JobRecord) -> Result<(), CoordinatorError> {
        if self.jobs.contains_key(&record.id) {
            return Err(CoordinatorError::DuplicateJob(record.id));
        }
        self.jobs.insert(record.id, record);
        Ok(())
    }

    /// Move a pending job to a final status
    pub fn finish(&mut self, id: &JobId, status: JobStatus) -> Result<(), CoordinatorError> {
        match self.jobs.get_mut(id) {
            Some(record) if record.status == JobStatus::Pending && status.is_final() => {
                record.status = status;
                Ok(())
            }
            _ => Err(CoordinatorError::InvalidJob(*id)),
        }
    }
}

#[cfg(test)]
mod test {
    use ethers::core::types::{Address, U256};

    use super::*;

    fn record(n: u8) -> JobRecord {
        JobRecord {
            id: [n; 32].into(),
            source_chain: 1,
            pod: 1,
            primary: Address::zero(),
            assigned_block: 1,
            assigned_at: 1,
            fallbacks: vec![],
            gas_limit: 1,
            gas_price: U256::one(),
            status: JobStatus::Pending,
        }
    }

    #[test]
    fn finished_jobs_stay_consumed() {
        let mut store = JobStore::default();
        store.insert(record(1)).unwrap();
        assert!(matches!(
            store.insert(record(1)),
            Err(CoordinatorError::DuplicateJob(_))
        ));

        let id = record(1).id;
        store.finish(&id, JobStatus::Completed).unwrap();
        assert!(store.finish(&id, JobStatus::Completed).is_err());
        assert!(store.pending(&id).is_err());
        assert!(store.insert(record(1)).is_err());
        assert_eq!(store.len(), 1);
        assert!(store.pending_ids().is_empty());
    }

    #[test]
    fn pending_is_not_a_final_status() {
        let mut store = JobStore::default();
        store.insert(record(2)).unwrap();
        let id = record(2).id;
        assert!(store.finish(&id, JobStatus::Pending).is_err());
        assert_eq!(store.pending_ids(), vec![id]);
    }
}
