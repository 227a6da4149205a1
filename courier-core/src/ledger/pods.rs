use courier_configuration::{apply_bps, ProtocolConfig};
use ethers::core::types::{Address, U256};
use std::collections::HashMap;

use crate::{BondRequirement, CoordinatorError};

/// Bond pricing of pods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondSchedule {
    unit: U256,
    operator_threshold: u32,
    step_bps: u32,
}

impl BondSchedule {
    /// Schedule from protocol parameters
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            unit: config.bond_unit,
            operator_threshold: config.operator_threshold,
            step_bps: config.threshold_step_bps,
        }
    }

    /// `unit * 2^(pod-1)`, saturating
    pub fn base(&self, pod: u32) -> U256 {
        let exponent = pod.saturating_sub(1);
        if exponent >= 256 {
            return U256::MAX;
        }
        let (factor, overflowed) = U256::from(2).overflowing_pow(exponent.into());
        if overflowed {
            return U256::MAX;
        }
        self.unit.saturating_mul(factor)
    }

    /// Members a pod holds before its bond starts rising
    pub fn threshold(&self, pod: u32) -> u32 {
        self.operator_threshold
            .checked_shr(pod.saturating_sub(1))
            .unwrap_or(0)
    }

    /// Current requirement of a pod with `base` and `members`
    pub fn current(&self, pod: u32, base: U256, members: usize) -> U256 {
        let excess = members.saturating_sub(self.threshold(pod) as usize);
        if excess == 0 {
            return base;
        }
        let increase = apply_bps(base.saturating_mul(U256::from(excess)), self.step_bps);
        base.saturating_add(increase)
    }
}

/// A pod's fixed parameters and ordered members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pod {
    base: U256,
    members: Vec<Address>,
}

impl Pod {
    /// Base bond, fixed at creation
    pub fn base(&self) -> U256 {
        self.base
    }

    /// Members in selection order
    pub fn members(&self) -> &[Address] {
        &self.members
    }
}

/// Ordered pod membership with O(1) swap-remove
#[derive(Debug, Clone)]
pub struct PodRegistry {
    schedule: BondSchedule,
    pods: Vec<Pod>,
    positions: HashMap<Address, (u32, usize)>,
}

impl PodRegistry {
    /// Empty registry pricing pods with `schedule`
    pub fn new(schedule: BondSchedule) -> Self {
        Self {
            schedule,
            pods: vec![],
            positions: HashMap::new(),
        }
    }

    /// Number of created pods. Pods are numbered `1..=count`
    pub fn count(&self) -> u32 {
        self.pods.len() as u32
    }

    /// Whether `pod` was created
    pub fn exists(&self, pod: u32) -> bool {
        pod >= 1 && pod <= self.count()
    }

    fn pod(&self, pod: u32) -> Result<&Pod, CoordinatorError> {
        if !self.exists(pod) {
            return Err(CoordinatorError::PodDoesNotExist(pod));
        }
        Ok(&self.pods[(pod - 1) as usize])
    }

    /// Requirement of an existing pod
    pub fn requirement(&self, pod: u32) -> Result<BondRequirement, CoordinatorError> {
        let entry = self.pod(pod)?;
        Ok(BondRequirement {
            base: entry.base,
            current: self.schedule.current(pod, entry.base, entry.members.len()),
        })
    }

    /// Requirement to join `pod`. The next uncreated pod is priced as empty
    pub fn entry_requirement(&self, pod: u32) -> Result<BondRequirement, CoordinatorError> {
        if pod == self.count() + 1 {
            let base = self.schedule.base(pod);
            return Ok(BondRequirement {
                base,
                current: base,
            });
        }
        self.requirement(pod)
    }

    /// All members of `pod`
    pub fn members(&self, pod: u32) -> Result<&[Address], CoordinatorError> {
        Ok(self.pod(pod)?.members())
    }

    /// Up to `count` members starting at `offset`
    pub fn slice(&self, pod: u32, offset: usize, count: usize) -> Result<Vec<Address>, CoordinatorError> {
        let members = self.members(pod)?;
        Ok(members.iter().skip(offset).take(count).copied().collect())
    }

    /// Number of members of `pod`
    pub fn member_count(&self, pod: u32) -> Result<usize, CoordinatorError> {
        Ok(self.members(pod)?.len())
    }

    /// Member at `position`, if the pod exists and is that large
    pub fn member_at(&self, pod: u32, position: usize) -> Option<Address> {
        self.pod(pod).ok()?.members.get(position).copied()
    }

    /// Pods with at least one member, ascending
    pub fn populated(&self) -> Vec<u32> {
        self.pods
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.members.is_empty())
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    /// Pod and position of `member`
    pub fn position_of(&self, member: Address) -> Option<(u32, usize)> {
        self.positions.get(&member).copied()
    }

    /// Append `member` to `pod`, creating it if it is the next pod.
    /// Callers validate beforehand
    pub(crate) fn join(&mut self, pod: u32, member: Address) -> Result<(), CoordinatorError> {
        if pod == self.count() + 1 {
            self.pods.push(Pod {
                base: self.schedule.base(pod),
                members: vec![],
            });
        }
        if !self.exists(pod) {
            return Err(CoordinatorError::PodDoesNotExist(pod));
        }
        let entry = &mut self.pods[(pod - 1) as usize];
        self.positions.insert(member, (pod, entry.members.len()));
        entry.members.push(member);
        Ok(())
    }

    /// Swap-remove `member` from its pod
    pub(crate) fn leave(&mut self, member: Address) -> Option<u32> {
        let (pod, position) = self.positions.remove(&member)?;
        let entry = &mut self.pods[(pod - 1) as usize];
        entry.members.swap_remove(position);
        if let Some(moved) = entry.members.get(position) {
            self.positions.insert(*moved, (pod, position));
        }
        Some(pod)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn registry() -> PodRegistry {
        let config = ProtocolConfig {
            bond_unit: U256::from(100),
            operator_threshold: 4,
            threshold_step_bps: 1_000,
            ..Default::default()
        };
        PodRegistry::new(BondSchedule::new(&config))
    }

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    #[test]
    fn base_bond_doubles_per_pod() {
        let registry = registry();
        assert_eq!(registry.entry_requirement(1).unwrap().base, U256::from(100));
        assert!(registry.requirement(1).is_err());
        assert_eq!(registry.schedule.base(2), U256::from(200));
        assert_eq!(registry.schedule.base(4), U256::from(800));
        assert_eq!(registry.schedule.base(300), U256::MAX);
    }

    #[test]
    fn only_the_next_pod_can_be_created() {
        let mut registry = registry();
        assert!(matches!(
            registry.requirement(2),
            Err(CoordinatorError::PodDoesNotExist(2))
        ));
        registry.join(1, addr(1)).unwrap();
        assert!(registry.exists(1));
        assert!(registry.join(3, addr(2)).is_err());
        assert!(registry.members(0).is_err());
    }

    #[test]
    fn current_bond_rises_past_the_threshold() {
        let mut registry = registry();
        for n in 1..=4 {
            registry.join(1, addr(n)).unwrap();
        }
        assert_eq!(registry.requirement(1).unwrap().current, U256::from(100));
        registry.join(1, addr(5)).unwrap();
        registry.join(1, addr(6)).unwrap();
        // two members over, 10% of base each
        let requirement = registry.requirement(1).unwrap();
        assert_eq!(requirement.base, U256::from(100));
        assert_eq!(requirement.current, U256::from(120));
        // pod 2 threshold is halved
        assert_eq!(registry.schedule.threshold(2), 2);
    }

    #[test]
    fn leaving_moves_the_last_member_into_the_gap() {
        let mut registry = registry();
        for n in 1..=4 {
            registry.join(1, addr(n)).unwrap();
        }
        assert_eq!(registry.leave(addr(2)), Some(1));
        assert_eq!(registry.members(1).unwrap(), &[addr(1), addr(4), addr(3)]);
        assert_eq!(registry.position_of(addr(4)), Some((1, 1)));
        assert_eq!(registry.position_of(addr(2)), None);

        assert_eq!(registry.leave(addr(3)), Some(1));
        assert_eq!(registry.members(1).unwrap(), &[addr(1), addr(4)]);
        assert_eq!(registry.leave(addr(9)), None);
    }

    #[test]
    fn slices_clamp_to_the_member_list() {
        let mut registry = registry();
        for n in 1..=3 {
            registry.join(1, addr(n)).unwrap();
        }
        assert_eq!(registry.slice(1, 1, 10).unwrap(), vec![addr(2), addr(3)]);
        assert!(registry.slice(1, 5, 1).unwrap().is_empty());
        assert_eq!(registry.populated(), vec![1]);
    }
}
