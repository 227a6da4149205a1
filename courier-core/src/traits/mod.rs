mod chain;
mod coordinator;
mod dispatch;
mod effect;
mod encode;
mod owners;
mod token;

pub use chain::*;
pub use coordinator::*;
pub use dispatch::*;
pub use effect::*;
pub use encode::*;
pub use owners::*;
pub use token::*;
