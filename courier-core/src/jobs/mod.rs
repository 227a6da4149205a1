//! Job lifecycle: assignment, execution windows and settlement

pub mod entropy;

mod executor;
mod scheduler;
mod store;
mod window;

pub use executor::*;
pub use scheduler::*;
pub use store::*;
pub use window::*;
