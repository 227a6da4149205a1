//! Destination-side coordination parameters

use courier_types::{deser_courier_u256, deser_courier_u32, deser_courier_u64, deser_courier_u8};
use ethers::types::U256;

/// How a freshly delivered job picks its pod
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PodPolicy {
    /// Every job lands in the same pod
    Fixed(u32),
    /// Pod drawn from job entropy among pods that have members
    Random,
}

impl Default for PodPolicy {
    fn default() -> Self {
        PodPolicy::Fixed(1)
    }
}

/// What happens once every fallback window of a job has lapsed
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AfterFallbacks {
    /// Any currently bonded operator may execute and collect the slash
    AnyBonded,
    /// Reject further attempts until governance steps in
    Stalled,
}

impl Default for AfterFallbacks {
    fn default() -> Self {
        AfterFallbacks::AnyBonded
    }
}

/// Protocol parameters for pods, bonds and execution windows
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolConfig {
    /// Length of each exclusive execution window, in seconds
    #[serde(deserialize_with = "deser_courier_u64")]
    pub window_duration: u64,
    /// Number of fallback positions recorded per job
    #[serde(deserialize_with = "deser_courier_u8")]
    pub fallback_count: u8,
    /// Pod selection policy
    #[serde(default)]
    pub pod_policy: PodPolicy,
    /// Base bond of pod 1. Pod `n` requires `bondUnit * 2^(n-1)`
    #[serde(deserialize_with = "deser_courier_u256")]
    pub bond_unit: U256,
    /// Members a pod holds before its current bond starts rising. Halves
    /// with every pod index
    #[serde(deserialize_with = "deser_courier_u32")]
    pub operator_threshold: u32,
    /// Increase of the current bond per member above the threshold, in
    /// basis points of the base bond
    #[serde(deserialize_with = "deser_courier_u32")]
    pub threshold_step_bps: u32,
    /// Allowed excess of the caller's gas price over the payload's price
    #[serde(default, deserialize_with = "deser_courier_u32")]
    pub spike_tolerance_bps: u32,
    /// Behavior after the last fallback window
    #[serde(default)]
    pub after_fallbacks: AfterFallbacks,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            window_duration: 60,
            fallback_count: 5,
            pod_policy: PodPolicy::default(),
            // 100 tokens at 18 decimals
            bond_unit: U256::exp10(20),
            operator_threshold: 1_000,
            threshold_step_bps: 100,
            spike_tolerance_bps: 0,
            after_fallbacks: AfterFallbacks::default(),
        }
    }
}

impl ProtocolConfig {
    /// Syntactically validate the protocol config
    pub fn validate(&self) -> eyre::Result<()> {
        eyre::ensure!(self.window_duration > 0, "windowDuration must be non-zero");
        eyre::ensure!(
            (1..=32).contains(&self.fallback_count),
            "fallbackCount must be between 1 and 32, got {}",
            self.fallback_count
        );
        eyre::ensure!(!self.bond_unit.is_zero(), "bondUnit must be non-zero");
        if let PodPolicy::Fixed(pod) = self.pod_policy {
            eyre::ensure!(pod > 0, "Pod indices start at 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn it_desers_protocol_configs() {
        let value = json! {{
            "windowDuration": 60,
            "fallbackCount": "5",
            "podPolicy": { "fixed": 2 },
            "bondUnit": "100000000000000000000",
            "operatorThreshold": 1000,
            "thresholdStepBps": "0x64",
            "afterFallbacks": "stalled"
        }};
        let conf: ProtocolConfig = serde_json::from_value(value).unwrap();
        assert_eq!(conf.pod_policy, PodPolicy::Fixed(2));
        assert_eq!(conf.bond_unit, U256::exp10(20));
        assert_eq!(conf.threshold_step_bps, 100);
        assert_eq!(conf.spike_tolerance_bps, 0);
        assert_eq!(conf.after_fallbacks, AfterFallbacks::Stalled);
        conf.validate().unwrap();
    }

    #[test]
    fn it_desers_random_policy() {
        let policy: PodPolicy = serde_json::from_value(json! { "random" }).unwrap();
        assert_eq!(policy, PodPolicy::Random);
    }

    #[test]
    fn zero_pod_is_invalid() {
        let conf = ProtocolConfig {
            pod_policy: PodPolicy::Fixed(0),
            ..Default::default()
        };
        assert!(conf.validate().is_err());
    }
}
