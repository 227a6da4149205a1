use ethers::core::types::{Address, U256};

/// How an operator's unbond authority is established
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatorKind {
    /// Plain account. Only the operator itself may unbond
    Account,
    /// Contract operator. Its recorded owner unbonds on its behalf
    Delegated {
        /// Address holding unbond authority
        owner: Address,
    },
}

impl OperatorKind {
    /// Whether `caller` may unbond `operator`
    pub fn may_unbond(&self, operator: Address, caller: Address) -> bool {
        match self {
            OperatorKind::Account => caller == operator,
            OperatorKind::Delegated { owner } => caller == *owner,
        }
    }
}

/// A bonded operator's ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondRecord {
    /// Tokens held for the operator
    pub amount: U256,
    /// Pod the operator belongs to
    pub pod: u32,
    /// Unbond authority
    pub kind: OperatorKind,
}

/// Bond required to join a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondRequirement {
    /// Fixed at pod creation
    pub base: U256,
    /// Rises with pod occupancy, never below base
    pub current: U256,
}

/// Where slashed value goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashBeneficiary {
    /// Credited to a bonded operator. Value stays in the ledger
    Bond(Address),
    /// Transferred out to an account
    Account(Address),
}

impl SlashBeneficiary {
    /// The receiving address
    pub fn address(&self) -> Address {
        match self {
            SlashBeneficiary::Bond(a) | SlashBeneficiary::Account(a) => *a,
        }
    }
}

/// Accounting of a single slash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashReceipt {
    /// Slashed operator
    pub operator: Address,
    /// Value removed from the operator's bond
    pub slashed: U256,
    /// Bond left in place. Zero when demoted
    pub remaining: U256,
    /// Leftover below the pod requirement returned to the operator
    pub refunded: U256,
    /// Whether the operator was removed from its pod
    pub demoted: bool,
    /// Receiver of the slashed value
    pub beneficiary: SlashBeneficiary,
}
