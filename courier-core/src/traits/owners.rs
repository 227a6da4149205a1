use ethers::core::types::Address;

/// Resolves the owner of contract operators at bond time
pub trait OwnerLookup: std::fmt::Debug + Send + Sync {
    /// `Some(owner)` if `operator` is a contract with an owner, `None` for
    /// plain accounts
    fn owner_of(&self, operator: Address) -> Option<Address>;
}
