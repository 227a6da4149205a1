//! Pod membership and bonded balances

mod bonds;
mod pods;

pub use bonds::*;
pub use pods::*;
