use courier_configuration::{AfterFallbacks, ProtocolConfig};
use ethers::core::types::Address;

use crate::{CoordinatorError, JobRecord, PodRegistry};

/// Where a pending job stands in its escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// No primary was assigned, anyone may execute
    Open,
    /// Exclusive window of the primary
    Primary,
    /// Fallback window `k`, 1-based
    Fallback(usize),
    /// Every fallback window has lapsed
    Exhausted,
}

impl WindowPhase {
    /// Phase of `record` at `now`
    pub fn at(record: &JobRecord, now: u64, window_duration: u64) -> Self {
        if record.is_open() {
            return WindowPhase::Open;
        }
        let elapsed = now.saturating_sub(record.assigned_at);
        let index = (elapsed / window_duration.max(1)) as usize;
        match index {
            0 => WindowPhase::Primary,
            k if k <= record.fallbacks.len() => WindowPhase::Fallback(k),
            _ => WindowPhase::Exhausted,
        }
    }

    /// Whether executing in this phase slashes the primary
    pub fn is_escalated(&self) -> bool {
        matches!(self, WindowPhase::Fallback(_) | WindowPhase::Exhausted)
    }
}

/// Decides who may execute a pending job at a given time
#[derive(Debug, Clone, Copy)]
pub struct ExecutionWindow<'a> {
    config: &'a ProtocolConfig,
    pods: &'a PodRegistry,
}

impl<'a> ExecutionWindow<'a> {
    /// Window manager over the current pod membership
    pub fn new(config: &'a ProtocolConfig, pods: &'a PodRegistry) -> Self {
        Self { config, pods }
    }

    /// Operator fallback window `k` belongs to. `None` when the recorded
    /// offset no longer resolves, which opens the window to anyone
    pub fn fallback_operator(&self, record: &JobRecord, k: usize) -> Option<Address> {
        let position = *record.fallbacks.get(k.checked_sub(1)?)?;
        self.pods.member_at(record.pod, position as usize)
    }

    /// Authorize `caller` at `now`. `is_bonded` answers for the window
    /// after the last fallback
    pub fn authorize(
        &self,
        record: &JobRecord,
        caller: Address,
        now: u64,
        is_bonded: impl Fn(Address) -> bool,
    ) -> Result<WindowPhase, CoordinatorError> {
        let phase = WindowPhase::at(record, now, self.config.window_duration);
        match phase {
            WindowPhase::Open => Ok(phase),
            WindowPhase::Primary if caller == record.primary => Ok(phase),
            WindowPhase::Primary => Err(CoordinatorError::OperatorHasTime {
                job: record.id,
                primary: record.primary,
            }),
            WindowPhase::Fallback(k) => match self.fallback_operator(record, k) {
                None => Ok(phase),
                Some(expected) if expected == caller => Ok(phase),
                Some(expected) => Err(CoordinatorError::InvalidFallback {
                    job: record.id,
                    window: k,
                    expected,
                }),
            },
            WindowPhase::Exhausted => match self.config.after_fallbacks {
                AfterFallbacks::Stalled => Err(CoordinatorError::FallbacksExhausted(record.id)),
                AfterFallbacks::AnyBonded if is_bonded(caller) => Ok(phase),
                AfterFallbacks::AnyBonded => Err(CoordinatorError::NotBonded(caller)),
            },
        }
    }
}
