use ethers::core::types::{Address, U256};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::{
    BondRecord, BondRequirement, BondSchedule, CoordinatorError, OperatorKind, PodRegistry,
    SlashBeneficiary, SlashReceipt, UtilityToken,
};

/// Bonded balances of operators, backed by tokens held at the ledger's
/// own address. Every operation checks all preconditions and performs its
/// token transfers before touching in-memory state
#[derive(Debug)]
pub struct BondingLedger<T> {
    address: Address,
    token: T,
    pods: PodRegistry,
    bonds: HashMap<Address, BondRecord>,
}

impl<T> BondingLedger<T>
where
    T: UtilityToken,
{
    /// Ledger holding its tokens at `address`
    pub fn new(address: Address, token: T, schedule: BondSchedule) -> Self {
        Self {
            address,
            token,
            pods: PodRegistry::new(schedule),
            bonds: HashMap::new(),
        }
    }

    /// Account holding all bonded tokens
    pub fn address(&self) -> Address {
        self.address
    }

    /// The bonding token
    pub fn token(&self) -> &T {
        &self.token
    }

    /// Mutable access to the bonding token
    pub fn token_mut(&mut self) -> &mut T {
        &mut self.token
    }

    /// Pod membership
    pub fn pods(&self) -> &PodRegistry {
        &self.pods
    }

    /// Bond record of `operator`
    pub fn record(&self, operator: Address) -> Option<&BondRecord> {
        self.bonds.get(&operator)
    }

    /// Whether `operator` holds a bond
    pub fn is_bonded(&self, operator: Address) -> bool {
        self.bonds.contains_key(&operator)
    }

    /// Bonded amount of `operator`, zero if unbonded
    pub fn bonded_amount(&self, operator: Address) -> U256 {
        self.bonds.get(&operator).map(|r| r.amount).unwrap_or_default()
    }

    /// Pod of `operator`, zero if unbonded
    pub fn bonded_pod(&self, operator: Address) -> u32 {
        self.bonds.get(&operator).map(|r| r.pod).unwrap_or_default()
    }

    /// Requirement of an existing pod
    pub fn requirement(&self, pod: u32) -> Result<BondRequirement, CoordinatorError> {
        self.pods.requirement(pod)
    }

    /// Sum of all bonded amounts
    pub fn total_bonded(&self) -> U256 {
        self.bonds
            .values()
            .fold(U256::zero(), |acc, r| acc.saturating_add(r.amount))
    }

    /// Bond `amount` for `operator` into `pod`, paid by `payer`
    pub fn bond(
        &mut self,
        payer: Address,
        operator: Address,
        amount: U256,
        pod: u32,
        kind: OperatorKind,
    ) -> Result<BondRecord, CoordinatorError> {
        if self.is_bonded(operator) {
            return Err(CoordinatorError::OperatorIsBonded(operator));
        }
        let requirement = self.pods.entry_requirement(pod)?;
        if amount < requirement.current {
            return Err(CoordinatorError::BondBelowMinimum {
                required: requirement.current,
                offered: amount,
            });
        }

        self.token
            .transfer_from(self.address, payer, self.address, amount)?;

        self.pods.join(pod, operator)?;
        let record = BondRecord { amount, pod, kind };
        self.bonds.insert(operator, record);
        info!(operator = ?operator, pod, amount = %amount, "Bonded operator");
        Ok(record)
    }

    /// Add `amount` to `operator`'s bond, paid by `payer`. Pod position is
    /// unchanged
    pub fn top_up(
        &mut self,
        payer: Address,
        operator: Address,
        amount: U256,
    ) -> Result<U256, CoordinatorError> {
        let current = self
            .bonds
            .get(&operator)
            .map(|r| r.amount)
            .ok_or(CoordinatorError::NotBonded(operator))?;

        self.token
            .transfer_from(self.address, payer, self.address, amount)?;

        let updated = current.saturating_add(amount);
        if let Some(record) = self.bonds.get_mut(&operator) {
            record.amount = updated;
        }
        debug!(operator = ?operator, amount = %amount, total = %updated, "Topped up bond");
        Ok(updated)
    }

    /// Remove `operator` and pay its full bond to `recipient`. `caller` must
    /// hold unbond authority over the operator
    pub fn unbond(
        &mut self,
        caller: Address,
        operator: Address,
        recipient: Address,
    ) -> Result<U256, CoordinatorError> {
        let record = *self
            .bonds
            .get(&operator)
            .ok_or(CoordinatorError::NotBonded(operator))?;
        if !record.kind.may_unbond(operator, caller) {
            return Err(CoordinatorError::NotOwner { operator, caller });
        }

        self.token.transfer(self.address, recipient, record.amount)?;

        self.remove(operator);
        info!(operator = ?operator, recipient = ?recipient, amount = %record.amount, "Unbonded operator");
        Ok(record.amount)
    }

    /// Take up to `amount` from `operator`'s bond and hand it to
    /// `beneficiary`. An operator left below its pod's current requirement
    /// is removed from the pod and the leftover refunded to it
    pub fn slash(
        &mut self,
        operator: Address,
        amount: U256,
        beneficiary: SlashBeneficiary,
    ) -> Result<SlashReceipt, CoordinatorError> {
        let record = *self
            .bonds
            .get(&operator)
            .ok_or(CoordinatorError::NotBonded(operator))?;
        if beneficiary.address() == operator {
            return Err(CoordinatorError::InvalidBeneficiary(operator));
        }
        if let SlashBeneficiary::Bond(receiver) = beneficiary {
            if !self.is_bonded(receiver) {
                return Err(CoordinatorError::InvalidBeneficiary(receiver));
            }
        }

        let slashed = amount.min(record.amount);
        let leftover = record.amount - slashed;
        let requirement = self.pods.requirement(record.pod)?;
        let demoted = leftover < requirement.current;
        let refunded = if demoted { leftover } else { U256::zero() };

        let outgoing = match beneficiary {
            SlashBeneficiary::Account(_) => slashed.saturating_add(refunded),
            SlashBeneficiary::Bond(_) => refunded,
        };
        let held = self.token.balance_of(self.address);
        if held < outgoing {
            return Err(crate::TokenError::InsufficientBalance {
                holder: self.address,
                needed: outgoing,
                available: held,
            }
            .into());
        }
        if let SlashBeneficiary::Account(receiver) = beneficiary {
            if !slashed.is_zero() {
                self.token.transfer(self.address, receiver, slashed)?;
            }
        }
        if !refunded.is_zero() {
            self.token.transfer(self.address, operator, refunded)?;
        }

        if demoted {
            self.remove(operator);
        } else if let Some(entry) = self.bonds.get_mut(&operator) {
            entry.amount = leftover;
        }
        if let SlashBeneficiary::Bond(receiver) = beneficiary {
            if let Some(entry) = self.bonds.get_mut(&receiver) {
                entry.amount = entry.amount.saturating_add(slashed);
            }
        }

        info!(
            operator = ?operator,
            beneficiary = ?beneficiary.address(),
            slashed = %slashed,
            demoted,
            refunded = %refunded,
            "Slashed operator"
        );
        Ok(SlashReceipt {
            operator,
            slashed,
            remaining: if demoted { U256::zero() } else { leftover },
            refunded,
            demoted,
            beneficiary,
        })
    }

    fn remove(&mut self, operator: Address) {
        self.pods.leave(operator);
        self.bonds.remove(&operator);
    }
}
