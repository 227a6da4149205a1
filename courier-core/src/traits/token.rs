use ethers::core::types::{Address, U256};

/// Token transfer failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Holder cannot cover the transfer
    #[error("{holder:?} holds {available} but {needed} is required")]
    InsufficientBalance {
        /// Debited account
        holder: Address,
        /// Transfer amount
        needed: U256,
        /// Current balance
        available: U256,
    },
    /// Spender was not approved for the amount
    #[error("{spender:?} may spend {allowed} of {owner:?} but {needed} is required")]
    InsufficientAllowance {
        /// Debited account
        owner: Address,
        /// Account moving the funds
        spender: Address,
        /// Transfer amount
        needed: U256,
        /// Remaining allowance
        allowed: U256,
    },
    /// Any other token failure
    #[error("{0}")]
    Custom(String),
}

/// The bonding token, as far as the ledger is concerned
pub trait UtilityToken: std::fmt::Debug {
    /// Balance of `who`
    fn balance_of(&self, who: Address) -> U256;

    /// Move `amount` out of `from`, acting as `from`
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError>;

    /// Move `amount` out of `from` using the allowance granted to `spender`
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;
}
