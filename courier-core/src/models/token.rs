use ethers::core::types::{Address, U256};
use std::collections::HashMap;

use crate::{TokenError, UtilityToken};

/// A plain balance/allowance token
#[derive(Debug, Default, Clone)]
pub struct MemoryToken {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl MemoryToken {
    /// Credit `amount` to `to`
    pub fn mint(&mut self, to: Address, amount: U256) {
        let balance = self.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Let `spender` move up to `amount` of `owner`'s tokens
    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Remaining allowance of `spender` over `owner`
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Sum of every balance
    pub fn total_supply(&self) -> U256 {
        self.balances
            .values()
            .fold(U256::zero(), |acc, b| acc.saturating_add(*b))
    }

    fn debit(&mut self, from: Address, amount: U256) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                holder: from,
                needed: amount,
                available,
            });
        }
        self.balances.insert(from, available - amount);
        Ok(())
    }
}

impl UtilityToken for MemoryToken {
    fn balance_of(&self, who: Address) -> U256 {
        self.balances.get(&who).copied().unwrap_or_default()
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        self.debit(from, amount)?;
        self.mint(to, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from,
                spender,
                needed: amount,
                allowed,
            });
        }
        self.debit(from, amount)?;
        if allowed != U256::MAX {
            self.allowances.insert((from, spender), allowed - amount);
        }
        self.mint(to, amount);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transfer_from_consumes_allowance() {
        let (owner, spender) = (Address::repeat_byte(1), Address::repeat_byte(2));
        let mut token = MemoryToken::default();
        token.mint(owner, U256::from(100));
        token.approve(owner, spender, U256::from(60));

        token
            .transfer_from(spender, owner, spender, U256::from(50))
            .unwrap();
        assert_eq!(token.allowance(owner, spender), U256::from(10));
        assert!(matches!(
            token.transfer_from(spender, owner, spender, U256::from(20)),
            Err(TokenError::InsufficientAllowance { .. })
        ));
        assert!(matches!(
            token.transfer(owner, spender, U256::from(51)),
            Err(TokenError::InsufficientBalance { .. })
        ));
        assert_eq!(token.total_supply(), U256::from(100));
    }
}
