use ethers::core::types::Address;
use std::collections::HashMap;

use crate::OwnerLookup;

/// Fixed operator to owner mapping. Unlisted operators are plain accounts
#[derive(Debug, Default, Clone)]
pub struct StaticOwners(HashMap<Address, Address>);

impl StaticOwners {
    /// Record `owner` as the owner of contract `operator`
    pub fn with_owner(mut self, operator: Address, owner: Address) -> Self {
        self.0.insert(operator, owner);
        self
    }
}

impl OwnerLookup for StaticOwners {
    fn owner_of(&self, operator: Address) -> Option<Address> {
        self.0.get(&operator).copied()
    }
}
