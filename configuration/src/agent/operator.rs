use courier_types::deser_courier_u64;
use ethers::types::Address;
use std::collections::HashSet;

/// Operator process configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    /// Bonded address this process executes jobs as
    pub operator: Address,
    /// Seconds between polls of pending jobs
    #[serde(deserialize_with = "deser_courier_u64")]
    pub interval: u64,
    /// Also pick up jobs whose fallback window names this operator
    #[serde(default = "default_true")]
    pub execute_as_fallback: bool,
    /// Only consider jobs assigned to these pods
    #[serde(default)]
    pub pods: Option<HashSet<u32>>,
}

fn default_true() -> bool {
    true
}
